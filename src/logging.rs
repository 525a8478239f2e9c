// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Logging setup shared by both binaries.
//!
//! Terminal output is filtered through `RUST_LOG`, defaulting to "info". Setting
//! `SL_HELLO_GOODBYE_LOG_DIR` additionally writes a log file into that directory, named by
//! `SL_HELLO_GOODBYE_LOG_FILE` and filtered through `SL_HELLO_GOODBYE_LOG`, which defaults to
//! "trace". Panics are routed into the log too.

use crate::Result;

use std::env::var;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter, Layer};

/// Default name of the log file.
pub const DEFAULT_LOG_FILE: &str = "sl_hello_goodbye.log";

/// Install global tracing subscriber.
///
/// # Errors
///
/// - Will fail if a filter directive cannot be parsed.
/// - Will fail if a global subscriber was already installed.
pub fn init() -> Result<()> {
    let terminal_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse(var("RUST_LOG").unwrap_or_default())?;
    let terminal = fmt::layer().with_target(false).with_filter(terminal_filter);

    let file = match var("SL_HELLO_GOODBYE_LOG_DIR") {
        Ok(log_dir) => {
            let log_file =
                var("SL_HELLO_GOODBYE_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.into());
            let file_filter = EnvFilter::builder()
                .with_default_directive(LevelFilter::TRACE.into())
                .parse(var("SL_HELLO_GOODBYE_LOG").unwrap_or_default())?;
            let appender = tracing_appender::rolling::never(log_dir, log_file);
            Some(fmt::layer().with_ansi(false).with_writer(appender).with_filter(file_filter))
        }
        Err(_) => None,
    };

    tracing_subscriber::registry().with(terminal).with(file).try_init()?;
    log_panics::init();

    Ok(())
}
