// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Command set implementation.
//!
//! This module is the forward facing API of internal library. It is meant to be used in `main` of
//! the `sl_hello_goodbye` binary.

use crate::{
    chatlog::{ChatEvent, ChatLogLine},
    config::{expand_path, Settings},
    notifier::{Notifier, NotifierKind},
    path::{chat_log_path, config_file},
    presence::{GreetingEvent, PresenceTracker, Trigger},
    tail::{ChatLogTail, TailStart},
    Error,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    future::Future,
    path::{Path, PathBuf},
};
use tabled::{builder::Builder, settings::Style, Table};
use tokio::{
    sync::mpsc::{self, error::SendError, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};

/// Greet Second Life avatars as they come and go.
#[derive(Debug, Clone, Parser)]
#[command(about, subcommand_help_heading = "Commands", version)]
pub struct SlHelloGoodbye {
    /// Use configuration file at path instead of the default one.
    #[arg(global = true, long, short, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Command-set interfaces.
    #[command(subcommand)]
    pub command: Command,
}

impl SlHelloGoodbye {
    /// Run command based on given arguments.
    ///
    /// # Errors
    ///
    /// Will fail if given command implementation fails.
    pub async fn run(self) -> Result<()> {
        let config = match self.config {
            Some(path) => path,
            None => config_file()?,
        };

        match self.command {
            Command::Watch(opts) => run_watch(&config, opts).await,
            Command::Parse(opts) => run_parse(&config, opts),
        }
    }
}

/// Full command-set.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Follow chat log and greet avatars as they arrive and leave.
    #[command(override_usage = "sl_hello_goodbye watch [options]")]
    Watch(WatchOptions),

    /// Parse chat log and list what happened in it.
    #[command(override_usage = "sl_hello_goodbye parse [options] <path>")]
    Parse(ParseOptions),
}

/// Follow chat log of an avatar.
#[derive(Parser, Clone, Debug, Default)]
#[command(author, about, long_about)]
pub struct WatchOptions {
    /// Login name of avatar whose chat log to follow.
    #[arg(short, long, value_name = "name")]
    pub avatar_name: Option<String>,

    /// Directory the viewer keeps its logs in.
    #[arg(short, long, value_name = "dir")]
    pub viewer_dir: Option<PathBuf>,

    /// How to deliver greetings.
    #[arg(short, long, value_enum, value_name = "kind")]
    pub notifier: Option<NotifierKind>,

    /// Presence level that counts as an avatar being here.
    #[arg(short, long, value_enum, value_name = "level")]
    pub trigger: Option<Trigger>,

    /// Greet for history already in the log instead of silently catching up.
    #[arg(short, long)]
    pub replay: bool,
}

impl WatchOptions {
    /// Override settings with flags given on the command line.
    ///
    /// Viewer directory is expanded the same way as in the configuration file.
    ///
    /// # Errors
    ///
    /// - Will fail if viewer directory cannot be expanded.
    pub fn apply(&self, settings: &mut Settings) -> crate::Result<()> {
        if let Some(avatar_name) = &self.avatar_name {
            settings.avatar_name = Some(avatar_name.clone());
        }

        if let Some(viewer_dir) = &self.viewer_dir {
            settings.viewer_dir = expand_path(viewer_dir)?;
        }

        if let Some(notifier) = self.notifier {
            settings.notifier = notifier;
        }

        if let Some(trigger) = self.trigger {
            settings.trigger = trigger;
        }

        Ok(())
    }
}

/// Parse a chat log file.
#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
pub struct ParseOptions {
    /// Path to chat log.
    #[arg(value_name = "path")]
    pub path: PathBuf,

    /// Only list greetings the watcher would deliver.
    #[arg(short, long)]
    pub greetings: bool,
}

#[instrument(skip(opts), level = "debug")]
async fn run_watch(config: &Path, opts: WatchOptions) -> Result<()> {
    let mut settings = Settings::load(config)?;
    opts.apply(&mut settings)?;
    settings.validate()?;

    let avatar = settings.avatar_name.as_deref().ok_or(Error::NoAvatarName)?;
    let path = chat_log_path(&settings.viewer_dir, avatar);
    if !path.is_file() {
        return Err(Error::ChatLogNotFound { path }.into());
    }

    let tracker = settings.presence_tracker();
    let notifier = settings.notifier()?;

    let mut tail = ChatLogTail::open(&path, TailStart::Beginning, settings.poll_interval())
        .await
        .with_context(|| format!("Failed to follow {path:?}"))?;

    let interrupted = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Interrupted, stop watching");
    };
    follow_chat_log(&mut tail, tracker, notifier, opts.replay, interrupted).await
}

/// Greet avatars from a followed chat log until `shutdown` resolves.
///
/// History already in the log only primes the tracker, unless `replay` is set. Greetings are
/// handed to a blocking worker, so a slow notifier never stalls the tail. A failed delivery is
/// logged and watching goes on.
///
/// # Errors
///
/// - Will fail if chat log can no longer be read.
pub async fn follow_chat_log(
    tail: &mut ChatLogTail,
    mut tracker: PresenceTracker,
    notifier: Box<dyn Notifier>,
    replay: bool,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let (deliveries, worker) = spawn_delivery(notifier);

    // INVARIANT: History never greets unless asked to.
    for line in tail.backlog().await?.iter().filter_map(|line| parse_line(line)) {
        if replay {
            greet(&mut tracker, &deliveries, &line);
        } else {
            tracker.prime(&line);
        }
    }
    info!("Following {:?}, already here: {:?}", tail.path(), tracker.present());

    tokio::pin!(shutdown);
    loop {
        let line = tokio::select! {
            line = tail.next_line() => line?,
            _ = &mut shutdown => break,
        };

        if let Some(line) = parse_line(&line) {
            greet(&mut tracker, &deliveries, &line);
        }
    }

    // Let pending greetings go out before returning.
    drop(deliveries);
    worker.await.context("Greeting delivery worker panicked")?;

    Ok(())
}

fn run_parse(config: &Path, opts: ParseOptions) -> Result<()> {
    let data = match std::fs::read(&opts.path) {
        Ok(data) => data,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::ChatLogNotFound { path: opts.path }.into());
        }
        Err(error) => {
            return Err(error).with_context(|| format!("Failed to read {:?}", opts.path));
        }
    };
    let lines = parse_chat_log(&String::from_utf8_lossy(&data));

    let table = if opts.greetings {
        let settings = Settings::load(config)?;
        settings.validate()?;
        greeting_table(&collect_greetings(settings.presence_tracker(), &lines))
    } else {
        event_table(&lines)
    };
    println!("{table}");

    Ok(())
}

fn spawn_delivery(
    mut notifier: Box<dyn Notifier>,
) -> (UnboundedSender<GreetingEvent>, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::unbounded_channel::<GreetingEvent>();
    let worker = tokio::task::spawn_blocking(move || {
        while let Some(event) = receiver.blocking_recv() {
            if let Err(error) = notifier.notify(&event) {
                warn!("Failed to deliver {} for {:?}: {error}", event.greeting, event.avatar);
            }
        }
    });

    (sender, worker)
}

fn greet(
    tracker: &mut PresenceTracker,
    deliveries: &UnboundedSender<GreetingEvent>,
    line: &ChatLogLine,
) {
    let Some(event) = tracker.observe(line) else {
        return;
    };

    debug!("{}", event.body());
    if let Err(SendError(event)) = deliveries.send(event) {
        warn!("Delivery worker gone, drop {} for {:?}", event.greeting, event.avatar);
    }
}

fn parse_line(line: &str) -> Option<ChatLogLine> {
    match line.parse::<ChatLogLine>() {
        Ok(line) => Some(line),
        Err(error) => {
            debug!("Skip line: {error}");
            None
        }
    }
}

/// Parse every line of a chat log, skipping lines that cannot be parsed.
pub fn parse_chat_log(data: &str) -> Vec<ChatLogLine> {
    data.lines().filter_map(parse_line).collect()
}

/// Run lines through tracker, collecting every greeting it produces.
pub fn collect_greetings(
    mut tracker: PresenceTracker,
    lines: &[ChatLogLine],
) -> Vec<GreetingEvent> {
    lines.iter().filter_map(|line| tracker.observe(line)).collect()
}

/// Tablize parsed chat log lines.
pub fn event_table(lines: &[ChatLogLine]) -> Table {
    let mut builder = Builder::new();
    builder.push_record(["Time", "Kind", "Avatar", "Detail"]);
    for line in lines {
        let (kind, avatar, detail) = match &line.event {
            ChatEvent::Avatar { name, action } => ("avatar", name.as_str(), action.to_string()),
            ChatEvent::System(message) => ("system", "", message.to_string()),
            ChatEvent::Other { text } => ("other", "", text.clone()),
        };
        builder.push_record([
            line.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind.to_string(),
            avatar.to_string(),
            detail,
        ]);
    }

    let mut table = builder.build();
    table.with(Style::ascii_rounded());
    table
}

/// Tablize greetings.
pub fn greeting_table(events: &[GreetingEvent]) -> Table {
    let mut builder = Builder::new();
    builder.push_record(["Time", "Greeting", "Avatar", "Detail"]);
    for event in events {
        builder.push_record([
            event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            event.greeting.to_string(),
            event.avatar.clone(),
            event.body(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::ascii_rounded());
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_verify_structure() {
        SlHelloGoodbye::command().debug_assert();
    }
}
