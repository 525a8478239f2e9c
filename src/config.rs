// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! User configuration.
//!
//! Settings are layered, with later layers overriding earlier ones:
//!
//! 1. Built-in defaults.
//! 2. Configuration file at `$XDG_CONFIG_HOME/sl-hello-goodbye/config.toml`, if it exists.
//! 3. Environment variables prefixed with `SL_HELLO_GOODBYE__`, e.g.,
//!    `SL_HELLO_GOODBYE__COOLDOWN_SECS=30`.
//! 4. Command line flags, applied by the caller.
//!
//! A double underscore separates the prefix so the logging variables `SL_HELLO_GOODBYE_LOG*` do
//! not leak into settings.

use crate::{
    notifier::{DesktopNotifier, LogNotifier, Notifier, NotifierKind, ScriptNotifier},
    path::default_viewer_dir,
    presence::{AvatarFilter, PresenceTracker, Trigger},
    Error, Result,
};

use chrono::TimeDelta;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, instrument};

/// Settings of the chat log watcher.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory the viewer keeps per-avatar logs in.
    pub viewer_dir: PathBuf,

    /// Login name of avatar whose chat log to watch.
    pub avatar_name: Option<String>,

    /// Presence level that counts as an avatar being "here".
    pub trigger: Trigger,

    /// Only greet avatars matching one of these patterns, all of them if empty.
    pub watch: Vec<String>,

    /// Never greet avatars matching any of these patterns.
    pub ignore: Vec<String>,

    /// Minimum number of seconds between two identical greetings for the same avatar.
    pub cooldown_secs: u64,

    /// How to deliver greetings.
    pub notifier: NotifierKind,

    /// Script to run for [`NotifierKind::Script`].
    pub script: Option<PathBuf>,

    /// How often to check the chat log for changes.
    pub poll_interval_ms: u64,

    /// Application name shown on desktop notifications.
    pub app_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            viewer_dir: PathBuf::from("~/.firestorm"),
            avatar_name: None,
            trigger: Trigger::default(),
            watch: Vec::new(),
            ignore: Vec::new(),
            cooldown_secs: 60,
            notifier: NotifierKind::default(),
            script: None,
            poll_interval_ms: 500,
            app_name: "SL Hello Goodbye".into(),
        }
    }
}

impl Settings {
    /// Load settings from configuration file and environment.
    ///
    /// A missing configuration file is fine, since every setting has a default. Paths are
    /// expanded, so `~` and `$VAR` work in them.
    ///
    /// # Errors
    ///
    /// - Will fail if configuration file contains invalid TOML or invalid values.
    /// - Will fail if a path cannot be expanded.
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        debug!("Load settings at {:?}", path.as_ref());
        let mut settings: Settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("SL_HELLO_GOODBYE")
                    .prefix_separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.expand_paths()?;

        Ok(settings)
    }

    /// Check settings for problems, reporting all of them at once.
    ///
    /// # Errors
    ///
    /// - Return [`Error::InvalidSettings`] listing every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.notifier == NotifierKind::Script && self.script.is_none() {
            problems.push("Script notifier selected, but no \"script\" given".to_string());
        }

        if self.poll_interval_ms == 0 {
            problems.push("\"poll_interval_ms\" must be greater than zero".to_string());
        }

        for pattern in self.watch.iter().chain(self.ignore.iter()) {
            if let Err(error) = glob::Pattern::new(pattern) {
                problems.push(format!("Invalid avatar pattern {pattern:?}: {error}"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidSettings { problems })
        }
    }

    /// Poll interval as duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Construct presence tracker described by settings.
    pub fn presence_tracker(&self) -> PresenceTracker {
        let cooldown = i64::try_from(self.cooldown_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        PresenceTracker::new(self.trigger, cooldown, AvatarFilter::new(&self.watch, &self.ignore))
    }

    /// Construct notifier described by settings.
    ///
    /// # Errors
    ///
    /// - Return [`Error::InvalidSettings`] if script notifier has no script.
    /// - Will fail if script cannot be read.
    pub fn notifier(&self) -> Result<Box<dyn Notifier>> {
        let notifier: Box<dyn Notifier> = match self.notifier {
            NotifierKind::Desktop => Box::new(DesktopNotifier::new(&self.app_name)),
            NotifierKind::Log => Box::new(LogNotifier),
            NotifierKind::Script => {
                let script = self.script.as_ref().ok_or_else(|| Error::InvalidSettings {
                    problems: vec!["Script notifier selected, but no \"script\" given".into()],
                })?;
                Box::new(ScriptNotifier::new(script)?)
            }
        };

        Ok(notifier)
    }

    fn expand_paths(&mut self) -> Result<()> {
        // INVARIANT: Empty viewer directory means the platform default.
        self.viewer_dir = if self.viewer_dir.as_os_str().is_empty() {
            default_viewer_dir()?
        } else {
            expand_path(&self.viewer_dir)?
        };

        if let Some(script) = &self.script {
            self.script = Some(expand_path(script)?);
        }

        Ok(())
    }
}

/// Expand `~` and environment variables in path.
///
/// # Errors
///
/// - Will fail if path names an environment variable that is not set.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(shellexpand::full(&path.to_string_lossy())?.into_owned().into())
}
