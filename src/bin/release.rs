// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use sl_hello_goodbye::{
    exit_status_from_error, logging,
    release::{BumpLevel, Origin, Release},
};

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Cut a new release of the project in the current directory.
///
/// Bumps the version, updates the changelog, commits, tags, pushes to "origin", and publishes.
#[derive(Debug, Clone, Parser)]
#[command(about, version)]
struct ReleaseCli {
    /// Part of the version to bump.
    #[arg(value_enum, value_name = "level")]
    level: BumpLevel,
}

fn main() {
    if let Err(error) = logging::init() {
        eprintln!("Failed to set up logging: {error}");
        std::process::exit(exitcode::SOFTWARE);
    }

    if let Err(error) = run() {
        tracing::error!("{error:?}");
        std::process::exit(exit_status_from_error(error));
    }

    std::process::exit(exitcode::OK);
}

fn run() -> Result<()> {
    let opts = ReleaseCli::parse();
    let root = std::env::current_dir()?;
    let version = Release::new(root, opts.level).run(&mut Origin::default())?;
    info!("Version {version} is out");

    Ok(())
}
