// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Release automation.
//!
//! Cutting a release is a fixed sequence of steps, run in order:
//!
//! 1. Bump the version in `Cargo.toml`, `Cargo.lock`, and the RPM spec under `packaging/`.
//! 2. Prepend a section for the new version to `CHANGELOG.md`, generated from the commits made
//!    since the previous release tag.
//! 3. Commit the changed files.
//! 4. Tag the commit as `v<version>`.
//! 5. Push branch and tag upstream.
//! 6. Publish the crate.
//!
//! The first failing step aborts the whole release. Nothing is rolled back or retried, the
//! failure is reported as [`Error::ReleaseStep`] naming the step, and the repository is left as
//! the failed step found it.

mod changelog;
mod manifest;
mod repo;

pub use changelog::{prepend_section, render_section, CommitKind, CommitSummary};
pub use manifest::{update_lock_version, update_rpm_spec_version, Manifest};
pub use repo::ReleaseRepo;

use crate::{utils::syscall_interactive, Error, Result};

use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use semver::{BuildMetadata, Prerelease, Version};
use std::{
    fs::{read_dir, read_to_string, write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Name of the changelog file at the project root.
pub const CHANGELOG: &str = "CHANGELOG.md";

/// Directory holding packaging descriptors.
pub const PACKAGING_DIR: &str = "packaging";

/// Part of the version to bump.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BumpLevel {
    /// Incompatible changes.
    Major,

    /// Backwards compatible features.
    Minor,

    /// Backwards compatible fixes.
    Patch,
}

impl BumpLevel {
    /// Compute next version.
    ///
    /// A pre-release that already sits on the requested level is finalized instead of bumped,
    /// so `1.3.0-rc.1` becomes `1.3.0` for a minor bump. Build metadata is always dropped.
    pub fn bump(self, version: &Version) -> Version {
        let pre = !version.pre.is_empty();
        let mut next = match self {
            BumpLevel::Major if pre && version.minor == 0 && version.patch == 0 => version.clone(),
            BumpLevel::Major => Version::new(version.major + 1, 0, 0),
            BumpLevel::Minor if pre && version.patch == 0 => version.clone(),
            BumpLevel::Minor => Version::new(version.major, version.minor + 1, 0),
            BumpLevel::Patch if pre => version.clone(),
            BumpLevel::Patch => Version::new(version.major, version.minor, version.patch + 1),
        };
        next.pre = Prerelease::EMPTY;
        next.build = BuildMetadata::EMPTY;
        next
    }
}

/// Remote side of a release.
///
/// Pushing and publishing are the only steps that leave the machine, so they sit behind this
/// trait.
pub trait Upstream: std::fmt::Debug {
    /// Push given refspecs.
    ///
    /// # Errors
    ///
    /// Will fail if remote rejects the push, or cannot be reached.
    fn push(&mut self, repo: &ReleaseRepo, refspecs: &[String]) -> Result<()>;

    /// Publish the package at project root.
    ///
    /// # Errors
    ///
    /// Will fail if publishing fails.
    fn publish(&mut self, root: &Path) -> Result<()>;
}

/// Push to a Git remote and publish through `cargo publish`.
#[derive(Debug, Clone)]
pub struct Origin {
    remote: String,
}

impl Origin {
    /// Use remote of given name.
    pub fn new(remote: impl Into<String>) -> Self {
        Self { remote: remote.into() }
    }
}

impl Default for Origin {
    fn default() -> Self {
        Self::new("origin")
    }
}

impl Upstream for Origin {
    fn push(&mut self, repo: &ReleaseRepo, refspecs: &[String]) -> Result<()> {
        repo.push(&self.remote, refspecs)
    }

    fn publish(&mut self, root: &Path) -> Result<()> {
        syscall_interactive("cargo", ["publish"], Some(root))
    }
}

/// Release of the project at some root directory.
#[derive(Debug, Clone)]
pub struct Release {
    root: PathBuf,
    level: BumpLevel,
    date: NaiveDate,
}

impl Release {
    /// Prepare release of project at root, dated today.
    pub fn new(root: impl Into<PathBuf>, level: BumpLevel) -> Self {
        Self { root: root.into(), level, date: Local::now().date_naive() }
    }

    /// Date the changelog entry differently.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Run every release step in order, stopping at the first failure.
    ///
    /// Returns the released version.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ReleaseStep`] wrapping the error of the first failing step.
    #[instrument(skip(self, upstream), fields(level = ?self.level), level = "debug")]
    pub fn run(&self, upstream: &mut dyn Upstream) -> Result<Version> {
        let root = step("preflight", || Ok(self.root.canonicalize()?))?;
        let repo = step("preflight", || {
            let repo = ReleaseRepo::discover(&root)?;
            let files = repo.dirty_files()?;
            if !files.is_empty() {
                return Err(Error::DirtyWorktree { files });
            }
            Ok(repo)
        })?;

        let (version, mut changed) = step("bump", || bump_version(&root, self.level))?;
        let tag = format!("v{version}");

        changed.push(step("changelog", || {
            write_changelog(&root, &repo, &version, self.date)
        })?);

        step("commit", || {
            let message = format!("chore(release): release version {version}");
            repo.commit_paths(&changed, &message)
        })?;

        step("tag", || repo.tag(&tag, &format!("Release {version}")))?;

        step("push", || {
            let branch = repo.current_branch()?;
            upstream.push(&repo, &[format!("refs/heads/{branch}"), format!("refs/tags/{tag}")])
        })?;

        step("publish", || upstream.publish(&root))?;
        info!("Released {version}");

        Ok(version)
    }
}

fn step<T>(name: &'static str, run: impl FnOnce() -> Result<T>) -> Result<T> {
    info!("Release step: {name}");
    run().map_err(|error| Error::ReleaseStep { step: name, source: Box::new(error) })
}

/// Bump version in every file that carries it, returning new version and changed files.
fn bump_version(root: &Path, level: BumpLevel) -> Result<(Version, Vec<PathBuf>)> {
    let mut changed = Vec::new();

    let mut manifest = Manifest::open(root.join("Cargo.toml"))?;
    let name = manifest.package_name()?;
    let current = manifest.version()?;
    let next = level.bump(&current);
    info!("Bump {name} from {current} to {next}");
    manifest.set_version(&next);
    manifest.save()?;
    changed.push(manifest.path().to_path_buf());

    let lock = root.join("Cargo.lock");
    if lock.exists() {
        write(&lock, update_lock_version(&read_to_string(&lock)?, &name, &next)?)?;
        changed.push(lock);
    }

    let packaging = root.join(PACKAGING_DIR);
    if packaging.is_dir() {
        for entry in read_dir(&packaging)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "spec") {
                debug!("Bump version of {path:?}");
                write(&path, update_rpm_spec_version(&read_to_string(&path)?, &next))?;
                changed.push(path);
            }
        }
    }

    Ok((next, changed))
}

fn write_changelog(
    root: &Path,
    repo: &ReleaseRepo,
    version: &Version,
    date: NaiveDate,
) -> Result<PathBuf> {
    let commits = repo
        .messages_since_last_release()?
        .iter()
        .map(|message| CommitSummary::parse(message))
        .filter(|commit| !commit.is_release())
        .collect::<Vec<_>>();
    debug!("{} commits since last release", commits.len());

    let path = root.join(CHANGELOG);
    let existing = match read_to_string(&path) {
        Ok(data) => Some(data),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => None,
        Err(error) => return Err(error.into()),
    };
    let section = render_section(version, date, &commits);
    write(&path, prepend_section(existing.as_deref(), &section))?;

    Ok(path)
}
