// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Greeting delivery.
//!
//! A [`Notifier`] takes a [`GreetingEvent`] and tells the user about it. Desktop notifications
//! are the default, but a user script can take over for anything fancier, like text-to-speech or
//! pushing to a phone.

use crate::{presence::GreetingEvent, utils::syscall_non_interactive, Error, Result};

use clap::ValueEnum;
use run_script::{run_script, ScriptOptions};
use serde::Deserialize;
use std::{collections::HashMap, fs::read_to_string, path::PathBuf};
use tracing::{debug, info, instrument};

/// Deliver greetings to the user.
pub trait Notifier: std::fmt::Debug + Send {
    /// Tell the user about a greeting.
    ///
    /// # Errors
    ///
    /// Will fail if greeting could not be delivered.
    fn notify(&mut self, event: &GreetingEvent) -> Result<()>;
}

/// Notifier variants selectable through configuration or the command line.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifierKind {
    /// Pop up desktop notifications through `notify-send`.
    #[default]
    Desktop,

    /// Run a user script for each greeting.
    Script,

    /// Only write greetings to the log.
    Log,
}

/// Desktop notifications through the freedesktop `notify-send` utility.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: String,
    app_name: String,
}

impl DesktopNotifier {
    /// Construct new desktop notifier showing notifications under given application name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self { program: "notify-send".into(), app_name: app_name.into() }
    }

    /// Use a different program with `notify-send` compatible arguments.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Notifier for DesktopNotifier {
    #[instrument(skip(self, event), level = "debug")]
    fn notify(&mut self, event: &GreetingEvent) -> Result<()> {
        let args = [format!("--app-name={}", self.app_name), event.summary(), event.body()];
        let output = syscall_non_interactive(&self.program, args, None)?;
        debug!("Desktop notification sent {output}");

        Ok(())
    }
}

/// Run a user script for each greeting.
///
/// Greeting details are passed through the environment:
///
/// - `SLHG_AVATAR`: name of avatar.
/// - `SLHG_GREETING`: "hello" or "goodbye".
/// - `SLHG_TRIGGER`: presence level that changed.
/// - `SLHG_TIMESTAMP`: chat log timestamp in ISO 8601 format.
/// - `SLHG_DISTANCE`: arrival distance in meters, empty if unknown.
#[derive(Debug, Clone)]
pub struct ScriptNotifier {
    path: PathBuf,
    script: String,
}

impl ScriptNotifier {
    /// Load script from given path.
    ///
    /// # Errors
    ///
    /// Will fail if script cannot be read.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let script = read_to_string(&path)?;
        Ok(Self { path, script })
    }

    fn environment(event: &GreetingEvent) -> HashMap<String, String> {
        HashMap::from([
            ("SLHG_AVATAR".into(), event.avatar.clone()),
            ("SLHG_GREETING".into(), event.greeting.to_string()),
            ("SLHG_TRIGGER".into(), event.trigger.to_string()),
            ("SLHG_TIMESTAMP".into(), event.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()),
            (
                "SLHG_DISTANCE".into(),
                event.distance.map(|distance| format!("{distance:.2}")).unwrap_or_default(),
            ),
        ])
    }
}

impl Notifier for ScriptNotifier {
    #[instrument(skip(self, event), level = "debug")]
    fn notify(&mut self, event: &GreetingEvent) -> Result<()> {
        let mut opts = ScriptOptions::new();
        opts.env_vars = Some(Self::environment(event));
        let (code, out, err) = run_script!(self.script, opts)?;
        if code != 0 {
            return Err(Error::ScriptFailed { script: self.path.clone(), code, stderr: err });
        }
        debug!("[{code}] {:?}\nstdout: {out}\nstderr: {err}", self.path);

        Ok(())
    }
}

/// Write greetings to the log only.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, event: &GreetingEvent) -> Result<()> {
        info!(avatar = %event.avatar, greeting = %event.greeting, "{}", event.body());
        Ok(())
    }
}
