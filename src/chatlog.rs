// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Chat log data model.
//!
//! Firestorm writes one line per event into an avatar's local chat log:
//!
//! ```text
//! [2025/03/14 18:02:11]  Jane Resident: hey there!
//! [2025/03/14 18:02:40]  Bob Builder entered chat range (12.47 m).
//! [2025/03/14 18:03:02]  Second Life: Teleport completed from http://maps.secondlife.com/secondlife/Ahern/128/128/23
//! ```
//!
//! The [`ChatLogLine`] type parses such a line into a timestamp and a typed [`ChatEvent`]. Any
//! body that cannot be recognized is kept as [`ChatEvent::Other`] rather than rejected, because
//! the viewer writes plenty of lines (emotes, object chatter, group notices) that carry nothing
//! this tool cares about.

mod system;

pub use system::{Location, RegionCoordinates, SystemMessage};

use crate::{Error, Result};

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

/// Speaker name the viewer uses for messages of its own, or of the grid.
const SYSTEM_SPEAKER: &str = "Second Life";

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?P<stamp>\d{4}/\d{1,2}/\d{1,2} \d{1,2}:\d{2}(?::\d{2})?)\]\s*(?P<body>.*)$")
        .unwrap()
});

static PRESENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^:]+?) is (?P<status>online|offline)\.?$").unwrap()
});

static ENTERED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>[^:]+?) (?:has )?entered (?P<zone>chat range|draw distance|the region)(?: \((?P<distance>\d+(?:\.\d+)?) ?m\))?\.?$",
    )
    .unwrap()
});

static LEFT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^:]+?) (?:has )?left (?P<zone>chat range|draw distance|the region)\.?$")
        .unwrap()
});

static CHAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^:]+?)(?: (?P<volume>whispers|shouts))?: (?P<text>.*)$").unwrap()
});

/// Single line of a local chat log.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatLogLine {
    /// Moment the viewer logged the event, in viewer local time.
    pub timestamp: NaiveDateTime,

    /// What happened at that moment.
    pub event: ChatEvent,
}

impl std::str::FromStr for ChatLogLine {
    type Err = Error;

    /// Parse a raw chat log line.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ParseChatLine`] if the line does not start with a timestamp. The viewer
    ///   writes multi-line messages as one timestamped line followed by bare lines, so callers
    ///   usually skip these.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let captures = TIMESTAMP.captures(line).ok_or_else(|| Error::ParseChatLine {
            line: line.into(),
            reason: "missing timestamp".into(),
        })?;

        let timestamp = parse_timestamp(&captures["stamp"]).ok_or_else(|| Error::ParseChatLine {
            line: line.into(),
            reason: "invalid timestamp".into(),
        })?;
        let event = captures["body"].parse::<ChatEvent>()?;

        Ok(Self { timestamp, event })
    }
}

impl std::fmt::Display for ChatLogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%Y/%m/%d %H:%M:%S"), self.event)
    }
}

fn parse_timestamp(stamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(stamp, "%Y/%m/%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(stamp, "%Y/%m/%d %H:%M"))
        .ok()
}

/// Event commemorated by a chat log line.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatEvent {
    /// Line about an avatar, or an object that behaves like one in the log.
    Avatar {
        /// Name of the avatar as the viewer printed it.
        name: String,

        /// What the avatar did.
        action: AvatarAction,
    },

    /// Message of the viewer or grid itself.
    System(SystemMessage),

    /// Anything else, kept verbatim.
    Other { text: String },
}

impl ChatEvent {
    /// Name of the avatar the event is about, if any.
    pub fn avatar(&self) -> Option<&str> {
        match self {
            ChatEvent::Avatar { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl std::str::FromStr for ChatEvent {
    type Err = Error;

    fn from_str(body: &str) -> Result<Self, Self::Err> {
        if let Some(text) = body
            .strip_prefix(SYSTEM_SPEAKER)
            .and_then(|rest| rest.strip_prefix(':'))
        {
            return Ok(ChatEvent::System(text.trim().parse()?));
        }

        if let Some(captures) = PRESENCE.captures(body) {
            let action = match &captures["status"] {
                "online" => AvatarAction::CameOnline,
                _ => AvatarAction::WentOffline,
            };
            return Ok(avatar_event(&captures["name"], action));
        }

        if let Some(captures) = ENTERED.captures(body) {
            let zone = captures["zone"].parse::<Zone>()?;
            // INVARIANT: Regex only admits well-formed decimals, so parsing cannot fail.
            let distance = captures.name("distance").and_then(|m| m.as_str().parse::<f64>().ok());
            return Ok(avatar_event(&captures["name"], AvatarAction::Entered { zone, distance }));
        }

        if let Some(captures) = LEFT.captures(body) {
            let zone = captures["zone"].parse::<Zone>()?;
            return Ok(avatar_event(&captures["name"], AvatarAction::Left { zone }));
        }

        if let Some(captures) = CHAT.captures(body) {
            let volume = match captures.name("volume").map(|m| m.as_str()) {
                Some("whispers") => ChatVolume::Whisper,
                Some("shouts") => ChatVolume::Shout,
                _ => ChatVolume::Say,
            };
            let action = AvatarAction::Chat { volume, text: captures["text"].into() };
            return Ok(avatar_event(&captures["name"], action));
        }

        Ok(ChatEvent::Other { text: body.into() })
    }
}

impl std::fmt::Display for ChatEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatEvent::Avatar { name, action } => write!(f, "{name} {action}"),
            ChatEvent::System(message) => write!(f, "{message}"),
            ChatEvent::Other { text } => write!(f, "{text}"),
        }
    }
}

fn avatar_event(name: &str, action: AvatarAction) -> ChatEvent {
    ChatEvent::Avatar { name: name.trim().into(), action }
}

/// Things an avatar can do according to the chat log.
#[derive(Clone, Debug, PartialEq)]
pub enum AvatarAction {
    /// Avatar whispered, said, or shouted something.
    Chat { volume: ChatVolume, text: String },

    /// Friend logged in.
    CameOnline,

    /// Friend logged out.
    WentOffline,

    /// Avatar entered a radar zone, at some distance in meters if the viewer reported it.
    Entered { zone: Zone, distance: Option<f64> },

    /// Avatar left a radar zone.
    Left { zone: Zone },
}

impl std::fmt::Display for AvatarAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvatarAction::Chat { volume, text } => write!(f, "{volume}: {text}"),
            AvatarAction::CameOnline => write!(f, "is online"),
            AvatarAction::WentOffline => write!(f, "is offline"),
            AvatarAction::Entered { zone, distance: Some(distance) } => {
                write!(f, "entered {zone} ({distance:.2} m)")
            }
            AvatarAction::Entered { zone, distance: None } => write!(f, "entered {zone}"),
            AvatarAction::Left { zone } => write!(f, "left {zone}"),
        }
    }
}

/// How far chat carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatVolume {
    /// 10 meters.
    Whisper,

    /// 20 meters, a.k.a. chat range.
    Say,

    /// 100 meters.
    Shout,
}

impl std::fmt::Display for ChatVolume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatVolume::Whisper => write!(f, "whispers"),
            ChatVolume::Say => write!(f, "says"),
            ChatVolume::Shout => write!(f, "shouts"),
        }
    }
}

/// Areas the nearby-avatar radar reports arrivals and departures for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Zone {
    /// Within 20 meters.
    ChatRange,

    /// Within the camera's draw distance.
    DrawDistance,

    /// Anywhere in the current region.
    Region,
}

impl std::str::FromStr for Zone {
    type Err = Error;

    fn from_str(phrase: &str) -> Result<Self, Self::Err> {
        match phrase {
            "chat range" => Ok(Zone::ChatRange),
            "draw distance" => Ok(Zone::DrawDistance),
            "the region" | "region" => Ok(Zone::Region),
            &_ => Err(Error::ParseChatLine { line: phrase.into(), reason: "unknown zone".into() }),
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::ChatRange => write!(f, "chat range"),
            Zone::DrawDistance => write!(f, "draw distance"),
            Zone::Region => write!(f, "the region"),
        }
    }
}
