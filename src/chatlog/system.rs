// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! System message parser.
//!
//! Lines spoken by "Second Life" come from the viewer or the grid. Only a handful have a shape
//! worth extracting; the rest are kept verbatim as [`SystemMessage::Other`].

use crate::{Error, Result};

use regex::Regex;
use std::{path::PathBuf, sync::LazyLock};
use tracing::debug;
use uuid::Uuid;

static SNAPSHOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Snapshot saved(?: to disk)?: (?P<path>.+)$").unwrap());

static PAID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^You paid secondlife:///app/agent/(?P<key>[0-9a-fA-F-]{36})/\w+ L\$(?P<amount>\d+)")
        .unwrap()
});

static PAID_YOU: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^secondlife:///app/agent/(?P<key>[0-9a-fA-F-]{36})/\w+ paid you L\$(?P<amount>\d+)")
        .unwrap()
});

static NOW_PLAYING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Now playing: (?P<song>.+)$").unwrap());

static TELEPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^Teleport completed from https?://maps\.secondlife\.com/secondlife/(?P<region>[^/]+)/(?P<x>-?\d+)/(?P<y>-?\d+)/(?P<z>-?\d+)",
    )
    .unwrap()
});

static OBJECT_GAVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:An object named )?(?P<object>.+?) owned by secondlife:///app/agent/(?P<owner>[0-9a-fA-F-]{36})/\w+ gave you (?:this )?'(?P<item>.+)'\.?$",
    )
    .unwrap()
});

static AVATAR_GAVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<avatar>.+?) gave you (?P<item>.+?)\.?$").unwrap());

/// Message of the viewer or the grid.
#[derive(Clone, Debug, PartialEq)]
pub enum SystemMessage {
    /// Snapshot was written to disk.
    SnapshotSaved { path: PathBuf },

    /// Current avatar paid someone.
    PaymentSent { recipient: Uuid, amount: u64 },

    /// Someone paid the current avatar.
    PaymentReceived { sender: Uuid, amount: u64 },

    /// Parcel media stream switched songs.
    NowPlaying { song: String },

    /// Teleport finished, starting from the given location.
    TeleportCompleted { origin: Location },

    /// Region the avatar is in is about to restart.
    RegionRestart,

    /// Object handed an inventory item to the current avatar.
    ObjectGaveItem { object: String, owner: Uuid, item: String },

    /// Avatar handed an inventory item to the current avatar.
    AvatarGaveItem { avatar: String, item: String },

    /// Any other system message.
    Other { text: String },
}

impl std::str::FromStr for SystemMessage {
    type Err = Error;

    /// Parse text of a system message.
    ///
    /// Never fails. A message that matches a known shape but carries a value that does not fit
    /// is kept verbatim as [`SystemMessage::Other`].
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match parse_known(text) {
            Ok(Some(message)) => Ok(message),
            Ok(None) => Ok(SystemMessage::Other { text: text.into() }),
            Err(error) => {
                debug!("Keep system message verbatim: {error}");
                Ok(SystemMessage::Other { text: text.into() })
            }
        }
    }
}

fn parse_known(text: &str) -> Result<Option<SystemMessage>> {
    if let Some(captures) = SNAPSHOT.captures(text) {
        return Ok(Some(SystemMessage::SnapshotSaved { path: captures["path"].trim().into() }));
    }

    if let Some(captures) = PAID.captures(text) {
        return Ok(Some(SystemMessage::PaymentSent {
            recipient: parse_key(text, &captures["key"])?,
            amount: parse_amount(text, &captures["amount"])?,
        }));
    }

    if let Some(captures) = PAID_YOU.captures(text) {
        return Ok(Some(SystemMessage::PaymentReceived {
            sender: parse_key(text, &captures["key"])?,
            amount: parse_amount(text, &captures["amount"])?,
        }));
    }

    if let Some(captures) = NOW_PLAYING.captures(text) {
        return Ok(Some(SystemMessage::NowPlaying { song: captures["song"].trim().into() }));
    }

    if let Some(captures) = TELEPORT.captures(text) {
        let coordinate = |name: &str| {
            captures[name].parse::<i16>().map_err(|_| Error::ParseChatLine {
                line: text.into(),
                reason: format!("coordinate {name} out of range"),
            })
        };
        let origin = Location {
            region: captures["region"].replace("%20", " "),
            coordinates: RegionCoordinates {
                x: coordinate("x")?,
                y: coordinate("y")?,
                z: coordinate("z")?,
            },
        };
        return Ok(Some(SystemMessage::TeleportCompleted { origin }));
    }

    if text.contains("about to restart") {
        return Ok(Some(SystemMessage::RegionRestart));
    }

    if let Some(captures) = OBJECT_GAVE.captures(text) {
        return Ok(Some(SystemMessage::ObjectGaveItem {
            object: captures["object"].into(),
            owner: parse_key(text, &captures["owner"])?,
            item: captures["item"].into(),
        }));
    }

    if let Some(captures) = AVATAR_GAVE.captures(text) {
        return Ok(Some(SystemMessage::AvatarGaveItem {
            avatar: captures["avatar"].into(),
            item: captures["item"].into(),
        }));
    }

    Ok(None)
}

impl std::fmt::Display for SystemMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemMessage::SnapshotSaved { path } => write!(f, "snapshot saved to {path:?}"),
            SystemMessage::PaymentSent { recipient, amount } => {
                write!(f, "paid L${amount} to {recipient}")
            }
            SystemMessage::PaymentReceived { sender, amount } => {
                write!(f, "received L${amount} from {sender}")
            }
            SystemMessage::NowPlaying { song } => write!(f, "now playing {song}"),
            SystemMessage::TeleportCompleted { origin } => {
                write!(f, "teleport completed from {origin}")
            }
            SystemMessage::RegionRestart => write!(f, "region is about to restart"),
            SystemMessage::ObjectGaveItem { object, owner, item } => {
                write!(f, "object {object:?} owned by {owner} gave {item:?}")
            }
            SystemMessage::AvatarGaveItem { avatar, item } => write!(f, "{avatar} gave {item:?}"),
            SystemMessage::Other { text } => write!(f, "{text}"),
        }
    }
}

fn parse_key(text: &str, key: &str) -> Result<Uuid> {
    Uuid::parse_str(key).map_err(|error| Error::ParseChatLine {
        line: text.into(),
        reason: format!("invalid avatar key: {error}"),
    })
}

fn parse_amount(text: &str, amount: &str) -> Result<u64> {
    amount.parse::<u64>().map_err(|error| Error::ParseChatLine {
        line: text.into(),
        reason: format!("invalid amount: {error}"),
    })
}

/// Position inside a named region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// Name of the region.
    pub region: String,

    /// Position inside the region.
    pub coordinates: RegionCoordinates,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let RegionCoordinates { x, y, z } = self.coordinates;
        write!(f, "{} ({x}, {y}, {z})", self.region)
    }
}

/// Region-local coordinates in meters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionCoordinates {
    /// East-west offset from the region's west edge.
    pub x: i16,

    /// North-south offset from the region's south edge.
    pub y: i16,

    /// Altitude.
    pub z: i16,
}
