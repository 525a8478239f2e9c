// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::GitFixture;
use sl_hello_goodbye::{
    release::{BumpLevel, Manifest, Origin, Release, ReleaseRepo, Upstream},
    Error,
};

use anyhow::Result;
use chrono::NaiveDate;
use indoc::{formatdoc, indoc};
use pretty_assertions::assert_eq as pretty_assert_eq;
use semver::Version;
use simple_txtar::Archive;
use std::path::{Path, PathBuf};

const PROJECT: &str = indoc! {r#"
    Project as of its 0.1.0 release.
    -- Cargo.toml --
    [package]
    name = "sl-hello-goodbye"
    version = "0.1.0"
    edition = "2021"
    -- Cargo.lock --
    version = 4

    [[package]]
    name = "sl-hello-goodbye"
    version = "0.1.0"
    -- packaging/sl-hello-goodbye.spec --
    Name:           sl-hello-goodbye
    Version:        0.1.0
    Release:        1%{?dist}

    %files
    %{_bindir}/*
"#};

fn manifest(version: &str) -> String {
    formatdoc! {r#"
        [package]
        name = "sl-hello-goodbye"
        version = "{version}"
        edition = "2021"
    "#}
}

/// Project with a 0.1.0 release, followed by a feature and a fix.
fn released_project(root: &Path) -> Result<GitFixture> {
    let git = GitFixture::new(root)?;
    let txtar = Archive::from(PROJECT);
    for file in txtar.iter() {
        git.write_and_commit(&file.name, &file.content, format!("chore: add {}", file.name))?;
    }
    git.write_and_commit(
        "CHANGELOG.md",
        "# Changelog\n\n## [0.1.0] - 2025-01-01\n\n- First release.\n",
        "chore(release): release version 0.1.0",
    )?;
    git.tag("v0.1.0")?;
    git.write_and_commit("src/lib.rs", "// radar\n", "feat(presence): greet on draw distance")?;
    git.write_and_commit("src/lib.rs", "// radar, fixed\n", "fix: stop greeting twice")?;

    Ok(git)
}

fn version_of(root: &Path) -> Result<Version> {
    Ok(Manifest::open(root.join("Cargo.toml"))?.version()?)
}

#[derive(Debug, Default)]
struct RecordingUpstream {
    steps: Vec<String>,
    fail_push: bool,
}

impl Upstream for RecordingUpstream {
    fn push(&mut self, _: &ReleaseRepo, refspecs: &[String]) -> sl_hello_goodbye::Result<()> {
        self.steps.push(format!("push {}", refspecs.join(" ")));
        if self.fail_push {
            return Err(Error::SyscallNonInteractive {
                program: "push".into(),
                message: "remote hung up".into(),
            });
        }
        Ok(())
    }

    fn publish(&mut self, root: &Path) -> sl_hello_goodbye::Result<()> {
        self.steps.push(format!("publish {}", root.display()));
        Ok(())
    }
}

fn release_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

#[test]
fn release_runs_every_step_in_order() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let git = released_project(dir.path())?;
    let root = dir.path().canonicalize()?;

    let mut upstream = RecordingUpstream::default();
    let version =
        Release::new(&root, BumpLevel::Patch).with_date(release_date()).run(&mut upstream)?;
    pretty_assert_eq!(version, Version::new(0, 1, 1));

    pretty_assert_eq!(version_of(&root)?, Version::new(0, 1, 1));
    let lock = std::fs::read_to_string(root.join("Cargo.lock"))?;
    assert!(lock.contains("version = \"0.1.1\""));
    let spec = std::fs::read_to_string(root.join("packaging/sl-hello-goodbye.spec"))?;
    assert!(spec.contains("Version:        0.1.1\n"));

    let changelog = std::fs::read_to_string(root.join("CHANGELOG.md"))?;
    let expect = indoc! {"
        # Changelog

        ## [0.1.1] - 2025-06-01

        ### Features

        - **presence:** greet on draw distance

        ### Bug Fixes

        - stop greeting twice

        ## [0.1.0] - 2025-01-01

        - First release.
    "};
    pretty_assert_eq!(changelog, expect);

    let head = git.repo().head()?.peel_to_commit()?;
    pretty_assert_eq!(head.summary(), Some("chore(release): release version 0.1.1"));
    let tag = git.repo().revparse_single("refs/tags/v0.1.1")?.peel_to_commit()?;
    pretty_assert_eq!(tag.id(), head.id());

    let repo = ReleaseRepo::discover(&root)?;
    assert!(repo.dirty_files()?.is_empty());
    pretty_assert_eq!(repo.latest_release_tag()?, Some("v0.1.1".to_string()));

    pretty_assert_eq!(
        upstream.steps,
        vec![
            "push refs/heads/main refs/tags/v0.1.1".to_string(),
            format!("publish {}", root.display()),
        ]
    );

    Ok(())
}

#[test]
fn release_refuses_dirty_worktree() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let _git = released_project(dir.path())?;
    std::fs::write(dir.path().join("src/lib.rs"), "// uncommitted\n")?;

    let mut upstream = RecordingUpstream::default();
    let result = Release::new(dir.path(), BumpLevel::Minor).run(&mut upstream);
    match result {
        Err(Error::ReleaseStep { step, source }) => {
            pretty_assert_eq!(step, "preflight");
            assert!(matches!(*source, Error::DirtyWorktree { ref files } if files == &["src/lib.rs"]));
        }
        other => panic!("expected preflight failure, got {other:?}"),
    }

    pretty_assert_eq!(version_of(dir.path())?, Version::new(0, 1, 0));
    assert!(upstream.steps.is_empty());

    Ok(())
}

#[test]
fn release_stops_at_first_failing_step() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let git = released_project(dir.path())?;

    let mut upstream = RecordingUpstream { fail_push: true, ..Default::default() };
    let result = Release::new(dir.path(), BumpLevel::Major).run(&mut upstream);
    assert!(matches!(result, Err(Error::ReleaseStep { step: "push", .. })));

    // Local steps stay done, publish never happens.
    assert!(git.repo().revparse_single("refs/tags/v1.0.0").is_ok());
    pretty_assert_eq!(upstream.steps, vec!["push refs/heads/main refs/tags/v1.0.0".to_string()]);

    Ok(())
}

#[test]
fn release_without_previous_tag_collects_all_commits() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let git = GitFixture::new(dir.path())?;
    git.write_and_commit("Cargo.toml", manifest("0.1.0-rc.1"), "feat: first cut")?;

    let mut upstream = RecordingUpstream::default();
    let version = Release::new(dir.path(), BumpLevel::Minor)
        .with_date(release_date())
        .run(&mut upstream)?;
    pretty_assert_eq!(version, Version::new(0, 1, 0));

    let changelog = std::fs::read_to_string(dir.path().join("CHANGELOG.md"))?;
    pretty_assert_eq!(
        changelog,
        "# Changelog\n\n## [0.1.0] - 2025-06-01\n\n### Features\n\n- first cut\n"
    );

    Ok(())
}

/// Push through a real remote, but never publish.
#[derive(Debug)]
struct LocalOrigin {
    origin: Origin,
    published: Option<PathBuf>,
}

impl Upstream for LocalOrigin {
    fn push(&mut self, repo: &ReleaseRepo, refspecs: &[String]) -> sl_hello_goodbye::Result<()> {
        self.origin.push(repo, refspecs)
    }

    fn publish(&mut self, root: &Path) -> sl_hello_goodbye::Result<()> {
        self.published = Some(root.to_path_buf());
        Ok(())
    }
}

#[test]
fn release_pushes_branch_and_tag_to_origin() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let project = dir.path().join("project");
    let remote = dir.path().join("remote.git");
    git2::Repository::init_bare(&remote)?;

    let git = released_project(&project)?;
    git.add_remote("origin", &remote)?;

    let mut upstream = LocalOrigin { origin: Origin::default(), published: None };
    Release::new(&project, BumpLevel::Patch).run(&mut upstream)?;

    let remote = git2::Repository::open_bare(&remote)?;
    let pushed = remote.find_reference("refs/heads/main")?.peel_to_commit()?;
    pretty_assert_eq!(pushed.id(), git.repo().head()?.peel_to_commit()?.id());
    assert!(remote.find_reference("refs/tags/v0.1.1").is_ok());
    pretty_assert_eq!(upstream.published, Some(project.canonicalize()?));

    Ok(())
}
