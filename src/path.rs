// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Cross-platform path manipulation.
//!
//! Provide basic utilities to determine where the viewer keeps its chat logs, and where this tool
//! keeps its own configuration.

use crate::{Error, Result};

use std::path::{Path, PathBuf};

/// Name of the local chat log file inside an avatar's log directory.
pub const LOCAL_CHAT_LOG: &str = "chat.txt";

/// Get absolute path to user's home directory.
///
/// # Errors
///
/// - Return [`Error::NoWayHome`] if path to home directory cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(Error::NoWayHome)
}

/// Get absolute path to the tool's configuration directory.
///
/// # Errors
///
/// - Return [`Error::NoWayConfig`] if path to configuration directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir().map(|path| path.join("sl-hello-goodbye")).ok_or(Error::NoWayConfig)
}

/// Default path to the configuration file.
///
/// # Errors
///
/// - Return [`Error::NoWayConfig`] if path to configuration directory cannot be determined.
pub fn config_file() -> Result<PathBuf> {
    config_dir().map(|path| path.join("config.toml"))
}

/// Directory Firestorm stores per-avatar logs in by default.
///
/// # Errors
///
/// - Return [`Error::NoWayHome`] if path to home directory cannot be determined.
pub fn default_viewer_dir() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".firestorm"))
}

/// Directory name the viewer uses for an avatar's logs.
///
/// The viewer uses the login name, not the display name. Spaces become underscores and everything
/// is lower-cased, so "Jane Resident" is stored under "jane_resident".
pub fn avatar_dir_name(avatar_name: impl AsRef<str>) -> String {
    avatar_name.as_ref().trim().replace(' ', "_").to_lowercase()
}

/// Path to the local chat log of an avatar under a viewer directory.
pub fn chat_log_path(viewer_dir: impl AsRef<Path>, avatar_name: impl AsRef<str>) -> PathBuf {
    viewer_dir.as_ref().join(avatar_dir_name(avatar_name)).join(LOCAL_CHAT_LOG)
}
