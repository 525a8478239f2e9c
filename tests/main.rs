// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

mod integration;

use anyhow::Result;
use git2::{Repository, RepositoryInitOptions};
use std::path::{Path, PathBuf};

/// Construct Git repository fixture.
pub struct GitFixture {
    repo: Repository,
    root: PathBuf,
}

impl GitFixture {
    /// Initialize new Git repository fixture on branch "main".
    ///
    /// # Errors
    ///
    /// Will fail if repository cannot be initialized or configured.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(path.as_ref(), &opts)?;

        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;

        Ok(Self { repo, root: path.as_ref().to_path_buf() })
    }

    /// Write file into worktree, then stage and commit it with given message.
    ///
    /// # Errors
    ///
    /// Will fail if file cannot be written or committed.
    pub fn write_and_commit(
        &self,
        filename: impl AsRef<Path>,
        contents: impl AsRef<str>,
        message: impl AsRef<str>,
    ) -> Result<()> {
        let path = self.root.join(filename.as_ref());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents.as_ref())?;

        let mut index = self.repo.index()?;
        index.add_path(filename.as_ref())?;
        index.write()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let signature = self.repo.signature()?;
        let mut parents = Vec::new();
        if let Some(parent) = self.repo.head().ok().and_then(|head| head.target()) {
            parents.push(self.repo.find_commit(parent)?);
        }
        let parents = parents.iter().collect::<Vec<_>>();

        self.repo.commit(Some("HEAD"), &signature, &signature, message.as_ref(), &tree, &parents)?;

        Ok(())
    }

    /// Tag HEAD with an annotated tag.
    ///
    /// # Errors
    ///
    /// Will fail if tag cannot be created.
    pub fn tag(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel(git2::ObjectType::Commit)?;
        self.repo.tag(name, &head, &self.repo.signature()?, name, false)?;
        Ok(())
    }

    /// Add remote to fixture.
    ///
    /// # Errors
    ///
    /// Will fail if remote already exists.
    pub fn add_remote(&self, name: &str, url: impl AsRef<Path>) -> Result<()> {
        self.repo.remote(name, &url.as_ref().to_string_lossy())?;
        Ok(())
    }

    /// Access underlying repository.
    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Root of worktree.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
