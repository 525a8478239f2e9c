// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use sl_hello_goodbye::{cmd::SlHelloGoodbye, exit_status_from_error, logging};

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() {
    if let Err(error) = logging::init() {
        eprintln!("Failed to set up logging: {error}");
        std::process::exit(exitcode::SOFTWARE);
    }

    if let Err(error) = run().await {
        tracing::error!("{error:?}");
        std::process::exit(exit_status_from_error(error));
    }

    std::process::exit(exitcode::OK);
}

async fn run() -> Result<()> {
    let opts = SlHelloGoodbye::parse();
    opts.run().await
}
