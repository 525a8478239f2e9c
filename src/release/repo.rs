// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git side of a release.

use crate::{Error, Result};

use auth_git2::GitAuthenticator;
use git2::{
    ObjectType, Oid, PushOptions, RemoteCallbacks, Repository, Sort, StatusOptions,
};
use semver::Version;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Repository a release is cut from.
pub struct ReleaseRepo {
    repository: Repository,
    authenticator: GitAuthenticator,
}

impl ReleaseRepo {
    /// Find repository containing path.
    ///
    /// # Errors
    ///
    /// Will fail if path is not inside a non-bare repository.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let repository = Repository::discover(path.as_ref())?;
        if repository.is_bare() {
            return Err(git2::Error::from_str("cannot release from a bare repository").into());
        }

        Ok(Self { repository, authenticator: GitAuthenticator::default() })
    }

    /// Absolute path to worktree.
    ///
    /// # Errors
    ///
    /// Will fail if worktree path cannot be resolved.
    pub fn workdir(&self) -> Result<PathBuf> {
        let workdir = self
            .repository
            .workdir()
            .ok_or_else(|| git2::Error::from_str("repository has no worktree"))?;
        Ok(workdir.canonicalize()?)
    }

    /// Tracked files with uncommitted changes.
    ///
    /// # Errors
    ///
    /// Will fail if status cannot be determined.
    pub fn dirty_files(&self) -> Result<Vec<String>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);
        let statuses = self.repository.statuses(Some(&mut opts))?;
        let files = statuses
            .iter()
            .filter(|entry| !entry.status().is_empty())
            .map(|entry| String::from_utf8_lossy(entry.path_bytes()).into_owned())
            .collect();

        Ok(files)
    }

    /// Name of branch pointed to by HEAD.
    ///
    /// # Errors
    ///
    /// - Return [`Error::DetachedHead`] if HEAD does not point to a branch.
    pub fn current_branch(&self) -> Result<String> {
        let head = self.repository.head()?;
        if !head.is_branch() {
            return Err(Error::DetachedHead);
        }

        Ok(String::from_utf8_lossy(head.shorthand_bytes()).into_owned())
    }

    /// Most recent release tag, by semver ordering of `v<version>` tags.
    ///
    /// # Errors
    ///
    /// Will fail if tags cannot be listed.
    pub fn latest_release_tag(&self) -> Result<Option<String>> {
        let names = self.repository.tag_names(Some("v*"))?;
        let latest = names
            .iter()
            .flatten()
            .filter_map(|name| {
                let version = Version::parse(name.strip_prefix('v')?).ok()?;
                Some((version, name.to_string()))
            })
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, name)| name);

        Ok(latest)
    }

    /// Full messages of commits reachable from HEAD but not from the latest release tag.
    ///
    /// Newest commit comes first. Every commit counts when there is no release tag yet.
    ///
    /// # Errors
    ///
    /// Will fail if history cannot be walked.
    #[instrument(skip(self), level = "debug")]
    pub fn messages_since_last_release(&self) -> Result<Vec<String>> {
        let mut revwalk = self.repository.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push_head()?;

        if let Some(tag) = self.latest_release_tag()? {
            debug!("Collect commits since {tag}");
            let commit = self.repository.revparse_single(&format!("refs/tags/{tag}"))?;
            revwalk.hide(commit.peel_to_commit()?.id())?;
        }

        let mut messages = Vec::new();
        for oid in revwalk {
            let commit = self.repository.find_commit(oid?)?;
            messages.push(String::from_utf8_lossy(commit.message_bytes()).into_owned());
        }

        Ok(messages)
    }

    /// Stage given files and commit them on top of HEAD.
    ///
    /// Paths may be absolute as long as they are inside the worktree.
    ///
    /// # Errors
    ///
    /// - Will fail if a path is outside the worktree.
    /// - Will fail if index or commit cannot be written.
    #[instrument(skip(self, paths), level = "debug")]
    pub fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<Oid> {
        let workdir = self.workdir()?;
        let mut index = self.repository.index()?;
        for path in paths {
            let relative = path.strip_prefix(&workdir).unwrap_or(path);
            debug!("Stage {relative:?}");
            index.add_path(relative)?;
        }
        index.write()?;

        let tree = self.repository.find_tree(index.write_tree()?)?;
        let signature = self.repository.signature()?;
        let parent = self.repository.head()?.peel_to_commit()?;
        let oid =
            self.repository.commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])?;
        info!("Commit {oid}: {message}");

        Ok(oid)
    }

    /// Create annotated tag on HEAD.
    ///
    /// # Errors
    ///
    /// Will fail if tag already exists.
    pub fn tag(&self, name: &str, message: &str) -> Result<Oid> {
        let target = self.repository.head()?.peel(ObjectType::Commit)?;
        let signature = self.repository.signature()?;
        let oid = self.repository.tag(name, &target, &signature, message, false)?;
        info!("Tag {name}");

        Ok(oid)
    }

    /// Push refspecs to remote, asking for credentials if needed.
    ///
    /// # Errors
    ///
    /// - Will fail if remote does not exist or cannot be reached.
    /// - Will fail if remote rejects any ref.
    #[instrument(skip(self), level = "debug")]
    pub fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        let mut remote = self.repository.find_remote(remote)?;
        let config = self.repository.config()?;

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(self.authenticator.credentials(&config));
        callbacks.push_update_reference(|refname, status| match status {
            Some(reason) => {
                warn!("Remote rejected {refname}: {reason}");
                Err(git2::Error::from_str(&format!("remote rejected {refname}: {reason}")))
            }
            None => Ok(()),
        });

        let mut opts = PushOptions::new();
        opts.remote_callbacks(callbacks);
        remote.push(refspecs, Some(&mut opts))?;
        info!("Pushed {refspecs:?} to {:?}", remote.name().unwrap_or_default());

        Ok(())
    }
}

impl std::fmt::Debug for ReleaseRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReleaseRepo {{ path: {:?}, ", self.repository.path())?;
        write!(f, "repository: (git2 stuff), ")?;
        write!(f, "authenticator: {:?} }}", self.authenticator)
    }
}
