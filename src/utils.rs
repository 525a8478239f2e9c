// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! General utilities.
//!
//! Helpers for calling external programs. Desktop notifications go through `notify-send`, and
//! releases go through `cargo publish`, so both need a small, uniform way to run a program and
//! turn its failure into an [`Error`].

use crate::{Error, Result};

use std::{ffi::OsStr, path::Path, process::Command};
use tracing::{debug, instrument};

/// Call external program non-interactively.
///
/// Collects stdout and stderr of the child process into a single string for the caller. The
/// child cannot be interacted with, stdin is closed. The streams are labeled "stdout: {stdout}"
/// and "stderr: {stderr}" respectively, and trailing newlines are chomped.
///
/// Runs in `work_dir` when given, otherwise in the current working directory.
///
/// # Errors
///
/// - Will fail if external program cannot be found.
/// - Return [`Error::SyscallNonInteractive`] if program exits with a non-zero status.
#[instrument(skip(cmd, args), level = "debug")]
pub fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    work_dir: Option<&Path>,
) -> Result<String> {
    let mut command = Command::new(cmd.as_ref());
    command.args(args);
    if let Some(work_dir) = work_dir {
        command.current_dir(work_dir);
    }
    debug!("Run {command:?}");

    let output = command.output()?;
    let message = label_output(&output.stdout, &output.stderr);

    if !output.status.success() {
        return Err(Error::SyscallNonInteractive {
            program: cmd.as_ref().to_string_lossy().into_owned(),
            message,
        });
    }

    Ok(message)
}

/// Call external program interactively.
///
/// Child inherits the terminal, so the user sees its progress and can answer its prompts.
///
/// # Errors
///
/// - Will fail if external program cannot be found.
/// - Return [`Error::SyscallNonInteractive`] if program exits with a non-zero status.
#[instrument(skip(cmd, args), level = "debug")]
pub fn syscall_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    work_dir: Option<&Path>,
) -> Result<()> {
    let mut command = Command::new(cmd.as_ref());
    command.args(args);
    if let Some(work_dir) = work_dir {
        command.current_dir(work_dir);
    }
    debug!("Run {command:?}");

    let status = command.spawn()?.wait()?;
    if !status.success() {
        return Err(Error::SyscallNonInteractive {
            program: cmd.as_ref().to_string_lossy().into_owned(),
            message: format!("exited with {status}"),
        });
    }

    Ok(())
}

fn label_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(format!("stdout: {stdout}").as_str());
    }

    if !stderr.is_empty() {
        message.push_str(format!("stderr: {stderr}").as_str());
    }

    // INVARIANT: Chomp trailing newlines.
    message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message)
}
