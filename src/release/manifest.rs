// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Format preserving version edits.
//!
//! Release commits should only touch the version numbers. Comments, ordering, and whitespace of
//! every edited file are kept as they were.

use crate::{Error, Result};

use regex::{Captures, Regex};
use semver::Version;
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
    sync::LazyLock,
};
use toml_edit::{DocumentMut, Item, Value};

static RPM_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?P<key>Version:[ \t]*)\S+").unwrap());

/// Cargo manifest of the released package.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    document: DocumentMut,
}

impl Manifest {
    /// Read manifest at path.
    ///
    /// # Errors
    ///
    /// - Will fail if manifest cannot be read.
    /// - Will fail if manifest contains invalid TOML.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = read_to_string(&path)?.parse::<DocumentMut>()?;
        Ok(Self { path, document })
    }

    /// Path manifest was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of package.
    ///
    /// # Errors
    ///
    /// - Return [`Error::NoPackageVersion`] if manifest has no package table or name.
    pub fn package_name(&self) -> Result<String> {
        self.document
            .get("package")
            .and_then(|package| package.get("name"))
            .and_then(Item::as_str)
            .map(Into::into)
            .ok_or(Error::NoPackageVersion { path: self.path.clone() })
    }

    /// Current version of package.
    ///
    /// # Errors
    ///
    /// - Return [`Error::NoPackageVersion`] if version is missing, or inherited from a
    ///   workspace.
    /// - Will fail if version is not valid semver.
    pub fn version(&self) -> Result<Version> {
        let version = self
            .document
            .get("package")
            .and_then(|package| package.get("version"))
            .and_then(Item::as_str)
            .ok_or(Error::NoPackageVersion { path: self.path.clone() })?;

        Ok(Version::parse(version)?)
    }

    /// Replace version of package.
    pub fn set_version(&mut self, version: &Version) {
        replace_version(&mut self.document["package"]["version"], version);
    }

    /// Write manifest back to where it was read from.
    ///
    /// # Errors
    ///
    /// Will fail if manifest cannot be written.
    pub fn save(&self) -> Result<()> {
        write(&self.path, self.document.to_string())?;
        Ok(())
    }
}

/// Set version of local package in lock file contents.
///
/// Only entries without a `source` are touched, so a registry dependency that happens to share
/// the package name is left alone.
///
/// # Errors
///
/// Will fail if lock file contents are invalid TOML.
pub fn update_lock_version(
    contents: &str,
    package: impl AsRef<str>,
    version: &Version,
) -> Result<String> {
    let mut document = contents.parse::<DocumentMut>()?;
    if let Some(entries) = document.get_mut("package").and_then(Item::as_array_of_tables_mut) {
        for entry in entries.iter_mut() {
            let is_local = entry.get("source").is_none();
            if is_local && entry.get("name").and_then(Item::as_str) == Some(package.as_ref()) {
                replace_version(&mut entry["version"], version);
            }
        }
    }

    Ok(document.to_string())
}

// INVARIANT: Keep decor of the old value, so trailing comments survive.
fn replace_version(item: &mut Item, version: &Version) {
    let decor = item.as_value().map(|old| old.decor().clone());
    let mut new = Value::from(version.to_string());
    if let Some(decor) = decor {
        *new.decor_mut() = decor;
    }
    *item = Item::Value(new);
}

/// Set `Version:` tag in RPM spec contents.
///
/// Spacing after the tag is kept. Contents without the tag are returned unchanged.
pub fn update_rpm_spec_version(contents: &str, version: &Version) -> String {
    RPM_VERSION
        .replace(contents, |captures: &Captures| format!("{}{version}", &captures["key"]))
        .into_owned()
}
