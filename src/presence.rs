// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Hello and goodbye detection.
//!
//! The radar is chatty. The same avatar can be reported entering chat range several times while
//! wandering along its edge, and entering draw distance says nothing about chat range. The
//! [`PresenceTracker`] keeps per-avatar state so that only real transitions of the chosen
//! [`Trigger`] turn into a [`GreetingEvent`].

use crate::chatlog::{AvatarAction, ChatEvent, ChatLogLine, Zone};

use chrono::{NaiveDateTime, TimeDelta};
use clap::ValueEnum;
use glob::{MatchOptions, Pattern};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, trace, warn};

/// Presence level that counts as an avatar being "here".
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    /// Friend is logged in.
    Online,

    /// Avatar is in the same region.
    Region,

    /// Avatar is within draw distance.
    DrawDistance,

    /// Avatar is within chat range.
    #[default]
    ChatRange,
}

impl Trigger {
    fn zone(self) -> Option<Zone> {
        match self {
            Trigger::Online => None,
            Trigger::Region => Some(Zone::Region),
            Trigger::DrawDistance => Some(Zone::DrawDistance),
            Trigger::ChatRange => Some(Zone::ChatRange),
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Online => write!(f, "online"),
            Trigger::Region => write!(f, "region"),
            Trigger::DrawDistance => write!(f, "draw-distance"),
            Trigger::ChatRange => write!(f, "chat-range"),
        }
    }
}

/// Greeting variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Greeting {
    /// Avatar arrived.
    Hello,

    /// Avatar departed.
    Goodbye,
}

impl std::fmt::Display for Greeting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Greeting::Hello => write!(f, "hello"),
            Greeting::Goodbye => write!(f, "goodbye"),
        }
    }
}

/// Greeting worth telling the user about.
#[derive(Clone, Debug, PartialEq)]
pub struct GreetingEvent {
    /// Avatar being greeted.
    pub avatar: String,

    /// Hello or goodbye.
    pub greeting: Greeting,

    /// Presence level that changed.
    pub trigger: Trigger,

    /// Distance in meters the avatar arrived at, if known.
    pub distance: Option<f64>,

    /// Chat log timestamp of the transition.
    pub timestamp: NaiveDateTime,
}

impl GreetingEvent {
    /// Short notification title.
    pub fn summary(&self) -> String {
        match self.greeting {
            Greeting::Hello => format!("Hello, {}!", self.avatar),
            Greeting::Goodbye => format!("Goodbye, {}!", self.avatar),
        }
    }

    /// Notification body describing the transition.
    pub fn body(&self) -> String {
        let what = match (self.greeting, self.trigger) {
            (Greeting::Hello, Trigger::Online) => "came online".to_string(),
            (Greeting::Goodbye, Trigger::Online) => "went offline".to_string(),
            (Greeting::Hello, _) => format!("entered {}", self.zone_phrase()),
            (Greeting::Goodbye, _) => format!("left {}", self.zone_phrase()),
        };

        match self.distance {
            Some(distance) => format!("{} {what} ({distance:.1} m away)", self.avatar),
            None => format!("{} {what}", self.avatar),
        }
    }

    fn zone_phrase(&self) -> String {
        self.trigger.zone().map(|zone| zone.to_string()).unwrap_or_default()
    }
}

/// Glob based allow and deny lists for avatar names.
///
/// Matching ignores case, since avatar names are case-insensitive in Second Life.
#[derive(Clone, Debug, Default)]
pub struct AvatarFilter {
    watch: Vec<Pattern>,
    ignore: Vec<Pattern>,
}

impl AvatarFilter {
    /// Construct new filter from watch and ignore patterns.
    ///
    /// Invalid patterns are logged and dropped, so one bad entry does not disable the rest.
    pub fn new(
        watch: impl IntoIterator<Item = impl AsRef<str>>,
        ignore: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        Self { watch: compile_patterns(watch), ignore: compile_patterns(ignore) }
    }

    /// Determine if the avatar should be greeted.
    pub fn allows(&self, avatar: impl AsRef<str>) -> bool {
        let opts = MatchOptions { case_sensitive: false, ..MatchOptions::new() };
        let avatar = avatar.as_ref();
        let watched = self.watch.is_empty()
            || self.watch.iter().any(|pattern| pattern.matches_with(avatar, opts));
        let ignored = self.ignore.iter().any(|pattern| pattern.matches_with(avatar, opts));

        watched && !ignored
    }
}

fn compile_patterns(patterns: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<Pattern> {
    let mut compiled = Vec::new();
    for pattern in patterns {
        match Pattern::new(pattern.as_ref()) {
            Ok(pattern) => compiled.push(pattern),
            Err(error) => warn!("Invalid pattern {:?}: {error}", pattern.as_ref()),
        }
    }

    compiled
}

#[derive(Debug, Default)]
struct AvatarPresence {
    online: bool,
    zones: HashSet<Zone>,
    last_greeted: HashMap<Greeting, NaiveDateTime>,
}

impl AvatarPresence {
    fn is_here(&self, trigger: Trigger) -> bool {
        match trigger.zone() {
            Some(zone) => self.zones.contains(&zone),
            None => self.online,
        }
    }

    fn apply(&mut self, action: &AvatarAction) {
        match action {
            AvatarAction::CameOnline => self.online = true,
            AvatarAction::WentOffline => {
                self.online = false;
                self.zones.clear();
            }
            AvatarAction::Entered { zone, .. } => {
                self.zones.insert(*zone);
            }
            AvatarAction::Left { zone } => {
                self.zones.remove(zone);
            }
            AvatarAction::Chat { .. } => {}
        }
    }

    /// Nothing left to remember once offline, out of every zone, and past every cooldown.
    fn is_forgettable(&self, now: NaiveDateTime, cooldown: TimeDelta) -> bool {
        !self.online
            && self.zones.is_empty()
            && self.last_greeted.values().all(|last| now.signed_duration_since(*last) >= cooldown)
    }
}

/// Track avatar presence to turn radar and friend status lines into greetings.
///
/// # Invariants
///
/// - Greetings only happen on a change of presence for the configured trigger.
/// - Same greeting for same avatar is never repeated within the cooldown.
#[derive(Debug)]
pub struct PresenceTracker {
    trigger: Trigger,
    cooldown: TimeDelta,
    filter: AvatarFilter,
    avatars: HashMap<String, AvatarPresence>,
}

impl PresenceTracker {
    /// Construct new tracker.
    pub fn new(trigger: Trigger, cooldown: TimeDelta, filter: AvatarFilter) -> Self {
        Self { trigger, cooldown, filter, avatars: HashMap::new() }
    }

    /// Update presence from chat log line, producing a greeting if one is due.
    #[instrument(skip(self, line), level = "trace")]
    pub fn observe(&mut self, line: &ChatLogLine) -> Option<GreetingEvent> {
        let (name, action) = match &line.event {
            ChatEvent::Avatar { name, action } => (name, action),
            _ => return None,
        };

        let event = self.transition(name, action, line.timestamp);
        self.forget_departed(line.timestamp);
        event
    }

    fn transition(
        &mut self,
        name: &str,
        action: &AvatarAction,
        timestamp: NaiveDateTime,
    ) -> Option<GreetingEvent> {
        let presence = self.avatars.entry(name.to_string()).or_default();
        let was_here = presence.is_here(self.trigger);
        presence.apply(action);
        let is_here = presence.is_here(self.trigger);

        let greeting = match (was_here, is_here) {
            (false, true) => Greeting::Hello,
            (true, false) => Greeting::Goodbye,
            _ => return None,
        };

        if !self.filter.allows(name) {
            trace!("Avatar {name:?} filtered out, no {greeting}");
            return None;
        }

        if let Some(last) = presence.last_greeted.get(&greeting) {
            if timestamp.signed_duration_since(*last) < self.cooldown {
                debug!("Suppress {greeting} for {name:?}, last one at {last}");
                return None;
            }
        }
        presence.last_greeted.insert(greeting, timestamp);

        let distance = match action {
            AvatarAction::Entered { distance, .. } if greeting == Greeting::Hello => *distance,
            _ => None,
        };

        Some(GreetingEvent {
            avatar: name.to_string(),
            greeting,
            trigger: self.trigger,
            distance,
            timestamp,
        })
    }

    fn forget_departed(&mut self, now: NaiveDateTime) {
        let cooldown = self.cooldown;
        self.avatars.retain(|_, presence| !presence.is_forgettable(now, cooldown));
    }

    /// Update presence without producing greetings.
    ///
    /// Used to replay history at startup, so avatars that were already around are not greeted
    /// again, yet still get a goodbye when they leave.
    pub fn prime(&mut self, line: &ChatLogLine) {
        if let ChatEvent::Avatar { name, action } = &line.event {
            self.avatars.entry(name.clone()).or_default().apply(action);
            self.forget_departed(line.timestamp);
        }
    }

    /// Number of avatars the tracker still holds state for.
    pub fn tracked(&self) -> usize {
        self.avatars.len()
    }

    /// Names of avatars currently considered here, sorted.
    pub fn present(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .avatars
            .iter()
            .filter(|(_, presence)| presence.is_here(self.trigger))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
