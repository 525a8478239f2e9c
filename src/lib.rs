// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Internal library for the sl-hello-goodbye tool.
//!
//! Second Life viewers like Firestorm keep a local chat log for each avatar that logs in. Besides
//! regular chat, the nearby-avatar radar writes a line every time another avatar enters or leaves
//! chat range, draw distance, or the region, and the friends list writes a line whenever a friend
//! comes online or goes offline. This tool tails that log and says "hello" and "goodbye" through
//! desktop notifications, so you notice arrivals even when the viewer is not in focus.
//!
//! ## Pieces
//!
//! - [`chatlog`] turns raw log lines into typed events.
//! - [`presence`] decides which events count as a hello or a goodbye.
//! - [`notifier`] delivers greetings to the desktop, a user script, or the log.
//! - [`tail`] follows the log file as the viewer appends to it.
//! - [`release`] is the release automation used to cut new versions of this very tool.
//!
//! The `sl_hello_goodbye` binary wires the first four together, and the `release` binary drives
//! the last one.

#![allow(dead_code)]
#![warn(
    clippy::complexity,
    clippy::correctness,
    missing_debug_implementations,
    rust_2021_compatibility
)]

pub mod chatlog;
pub mod cmd;
pub mod config;
pub mod logging;
pub mod notifier;
pub mod path;
pub mod presence;
pub mod release;
pub mod tail;
pub mod utils;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

/// All possible error variants of the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot determine path to home directory")]
    NoWayHome,

    #[error("Cannot determine path to configuration directory")]
    NoWayConfig,

    #[error("No avatar name given, use --avatar-name or set \"avatar_name\" in configuration")]
    NoAvatarName,

    #[error("Local chat log {path:?} does not exist for this avatar")]
    ChatLogNotFound { path: PathBuf },

    #[error("Cannot parse chat log line {line:?}: {reason}")]
    ParseChatLine { line: String, reason: String },

    #[error("Invalid settings:\n{}", .problems.join("\n"))]
    InvalidSettings { problems: Vec<String> },

    #[error("Program {program:?} failed:\n{message}")]
    SyscallNonInteractive { program: String, message: String },

    #[error("Script {script:?} exited with status {code}:\n{stderr}")]
    ScriptFailed { script: PathBuf, code: i32, stderr: String },

    #[error("Worktree has uncommitted changes: {}", .files.join(", "))]
    DirtyWorktree { files: Vec<String> },

    #[error("Manifest {path:?} has no package version")]
    NoPackageVersion { path: PathBuf },

    #[error("Repository HEAD does not point to a branch")]
    DetachedHead,

    #[error("Release step {step:?} failed: {source}")]
    ReleaseStep {
        step: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ::config::ConfigError),

    #[error(transparent)]
    Git2(#[from] git2::Error),

    #[error(transparent)]
    TomlEdit(#[from] toml_edit::TomlError),

    #[error(transparent)]
    Semver(#[from] semver::Error),

    #[error(transparent)]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    ShellExpand(#[from] shellexpand::LookupError<std::env::VarError>),

    #[error(transparent)]
    RunScript(#[from] run_script::ScriptError),

    #[error(transparent)]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    LogInit(#[from] tracing_subscriber::util::TryInitError),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Determine exit status of binaries from the error that made them bail.
///
/// Follows `sysexits.h` conventions through the `exitcode` crate. Errors that did not originate
/// from this library are treated as internal software errors.
pub fn exit_status_from_error(error: anyhow::Error) -> exitcode::ExitCode {
    match error.downcast_ref::<Error>() {
        Some(error) => exit_status_of(error),
        None => exitcode::SOFTWARE,
    }
}

fn exit_status_of(error: &Error) -> exitcode::ExitCode {
    match error {
        Error::NoWayHome | Error::NoWayConfig => exitcode::OSFILE,
        Error::NoAvatarName | Error::InvalidSettings { .. } | Error::Config(..) => exitcode::CONFIG,
        Error::ShellExpand(..) | Error::LogFilter(..) => exitcode::CONFIG,
        Error::ChatLogNotFound { .. } => exitcode::NOINPUT,
        Error::ParseChatLine { .. } | Error::TomlEdit(..) | Error::Semver(..) => exitcode::DATAERR,
        Error::SyscallNonInteractive { .. } | Error::ScriptFailed { .. } => exitcode::UNAVAILABLE,
        Error::RunScript(..) => exitcode::UNAVAILABLE,
        Error::DirtyWorktree { .. } | Error::DetachedHead => exitcode::TEMPFAIL,
        Error::NoPackageVersion { .. } => exitcode::DATAERR,
        Error::ReleaseStep { source, .. } => exit_status_of(source),
        Error::Io(..) | Error::Watch(..) => exitcode::IOERR,
        Error::Git2(..) | Error::LogInit(..) => exitcode::SOFTWARE,
    }
}
