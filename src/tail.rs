// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Chat log follower.
//!
//! Works like `tail -F`: yields complete lines as the viewer appends them, survives the log being
//! truncated or replaced, and does not mind the log vanishing for a moment. A poll watcher wakes
//! the follower on changes, and a plain timer backs it up in case an event goes missing.

use crate::Result;

use notify::{Config, PollWatcher, RecursiveMode, Watcher};
use std::{
    collections::VecDeque,
    io::SeekFrom,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{
    io::{AsyncReadExt, AsyncSeekExt},
    sync::mpsc,
};
use tracing::{debug, instrument, trace, warn};

/// Where to start following from.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum TailStart {
    /// Yield every line already in the file first.
    Beginning,

    /// Only yield lines written after opening.
    #[default]
    End,
}

/// Follow a chat log line by line.
///
/// # Invariants
///
/// - Only complete lines are yielded, partial writes wait for their newline.
/// - Reading restarts from the top if the file shrinks.
pub struct ChatLogTail {
    path: PathBuf,
    offset: u64,
    partial: Vec<u8>,
    lines: VecDeque<String>,
    poll_interval: Duration,
    wakeups: mpsc::Receiver<()>,
    _watcher: PollWatcher,
}

impl ChatLogTail {
    /// Start following file at path.
    ///
    /// # Errors
    ///
    /// - Will fail if the file cannot be inspected.
    /// - Will fail if the file watcher cannot be set up.
    #[instrument(skip(path), level = "debug")]
    pub async fn open(
        path: impl AsRef<Path>,
        start: TailStart,
        poll_interval: Duration,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let offset = match start {
            TailStart::Beginning => 0,
            TailStart::End => tokio::fs::metadata(&path).await?.len(),
        };
        debug!("Follow {path:?} from offset {offset}");

        let (tx, wakeups) = mpsc::channel(1);
        let mut watcher = PollWatcher::new(
            move |event: notify::Result<notify::Event>| {
                if event.is_ok() {
                    // Full channel means a wakeup is already pending.
                    let _ = tx.try_send(());
                }
            },
            Config::default().with_poll_interval(poll_interval),
        )?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        Ok(Self {
            path,
            offset,
            partial: Vec::new(),
            lines: VecDeque::new(),
            poll_interval,
            wakeups,
            _watcher: watcher,
        })
    }

    /// Path of followed file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take every complete line available right now, without waiting.
    ///
    /// Opening from [`TailStart::Beginning`] and draining the backlog first separates history
    /// from new lines without missing anything written in between.
    ///
    /// # Errors
    ///
    /// Will fail if the file exists but cannot be read.
    pub async fn backlog(&mut self) -> Result<Vec<String>> {
        self.read_available().await?;
        Ok(self.lines.drain(..).collect())
    }

    /// Wait for next complete line.
    ///
    /// Trailing carriage returns are stripped, and invalid UTF-8 is replaced.
    ///
    /// # Errors
    ///
    /// Will fail if the file exists but cannot be read.
    pub async fn next_line(&mut self) -> Result<String> {
        loop {
            if let Some(line) = self.lines.pop_front() {
                return Ok(line);
            }

            self.read_available().await?;
            if !self.lines.is_empty() {
                continue;
            }

            tokio::select! {
                _ = self.wakeups.recv() => trace!("Woken by watcher"),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    async fn read_available(&mut self) -> Result<()> {
        let mut file = match tokio::fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                trace!("{:?} missing, waiting for it to come back", self.path);
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };

        let len = file.metadata().await?.len();
        if len < self.offset {
            warn!("{:?} shrank from {} to {len} bytes, reading from the top", self.path, self.offset);
            self.offset = 0;
            self.partial.clear();
        }

        if len == self.offset {
            return Ok(());
        }

        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut buffer = Vec::new();
        let read = file.read_to_end(&mut buffer).await?;
        self.offset += read as u64;
        self.partial.extend_from_slice(&buffer);

        while let Some(newline) = self.partial.iter().position(|byte| *byte == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&raw);
            self.lines.push_back(line.trim_end_matches(['\r', '\n']).to_string());
        }

        Ok(())
    }
}

impl std::fmt::Debug for ChatLogTail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChatLogTail {{ path: {:?}, ", self.path)?;
        write!(f, "offset: {}, ", self.offset)?;
        write!(f, "pending: {}, ", self.lines.len())?;
        write!(f, "watcher: (notify stuff) }}")
    }
}
