// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Changelog generation from commit messages.
//!
//! Commit messages are read as [conventional commits][cc]. Anything not following the format
//! still shows up, just under "Miscellaneous".
//!
//! [cc]: https://www.conventionalcommits.org/en/v1.0.0/

use chrono::NaiveDate;
use regex::Regex;
use semver::Version;
use std::{fmt::Write as _, sync::LazyLock};

static CONVENTIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<kind>[A-Za-z]+)(?:\((?P<scope>[^)]*)\))?(?P<bang>!)?:\s*(?P<description>.+)$")
        .unwrap()
});

const HEADER: &str = "# Changelog";

/// Changelog section a commit belongs in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommitKind {
    /// Conventional `feat` commit.
    Feature,

    /// Conventional `fix` commit.
    Fix,

    /// Any other type, or no conventional prefix at all.
    Other,
}

impl CommitKind {
    fn heading(self) -> &'static str {
        match self {
            CommitKind::Feature => "Features",
            CommitKind::Fix => "Bug Fixes",
            CommitKind::Other => "Miscellaneous",
        }
    }
}

/// Changelog relevant parts of a commit message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitSummary {
    /// Section the commit is listed under.
    pub kind: CommitKind,

    /// Conventional type as written, e.g., `feat` or `docs`.
    pub type_name: Option<String>,

    /// Parenthesized scope after the type.
    pub scope: Option<String>,

    /// Subject line without type and scope.
    pub description: String,

    /// Commit announces a breaking change.
    pub breaking: bool,
}

impl CommitSummary {
    /// Parse full commit message.
    ///
    /// Only the subject line is used for the description. A `!` after the type, or a
    /// `BREAKING CHANGE:` footer marks the commit as breaking.
    pub fn parse(message: impl AsRef<str>) -> Self {
        let message = message.as_ref();
        let subject = message.lines().next().unwrap_or_default().trim();
        let footer_breaking = message
            .lines()
            .any(|line| line.starts_with("BREAKING CHANGE:") || line.starts_with("BREAKING-CHANGE:"));

        match CONVENTIONAL.captures(subject) {
            Some(captures) => {
                let type_name = captures["kind"].to_lowercase();
                let kind = match type_name.as_str() {
                    "feat" => CommitKind::Feature,
                    "fix" => CommitKind::Fix,
                    _ => CommitKind::Other,
                };
                Self {
                    kind,
                    type_name: Some(type_name),
                    scope: captures
                        .name("scope")
                        .map(|scope| scope.as_str().trim().to_string())
                        .filter(|scope| !scope.is_empty()),
                    description: captures["description"].trim().into(),
                    breaking: captures.name("bang").is_some() || footer_breaking,
                }
            }
            None => Self {
                kind: CommitKind::Other,
                type_name: None,
                scope: None,
                description: subject.into(),
                breaking: footer_breaking,
            },
        }
    }

    /// Determine if commit is a previous release commit.
    pub fn is_release(&self) -> bool {
        self.type_name.as_deref() == Some("chore") && self.scope.as_deref() == Some("release")
    }

    fn entry(&self) -> String {
        let mut entry = String::from("- ");
        if self.breaking {
            entry.push_str("**BREAKING** ");
        }
        if let Some(scope) = &self.scope {
            let _ = write!(entry, "**{scope}:** ");
        }
        entry.push_str(&self.description);
        entry
    }
}

/// Render changelog section for a version.
///
/// Groups are ordered features, fixes, then everything else. Commits keep their given order
/// inside each group.
pub fn render_section(version: &Version, date: NaiveDate, commits: &[CommitSummary]) -> String {
    let mut section = format!("## [{version}] - {}\n", date.format("%Y-%m-%d"));

    if commits.is_empty() {
        section.push_str("\n- No notable changes.\n");
        return section;
    }

    for kind in [CommitKind::Feature, CommitKind::Fix, CommitKind::Other] {
        let entries: Vec<String> =
            commits.iter().filter(|commit| commit.kind == kind).map(CommitSummary::entry).collect();
        if entries.is_empty() {
            continue;
        }

        let _ = write!(section, "\n### {}\n\n", kind.heading());
        for entry in entries {
            section.push_str(&entry);
            section.push('\n');
        }
    }

    section
}

/// Put section on top of existing changelog contents.
///
/// Keeps the `# Changelog` header and any introduction below it in front of the new section.
/// Creates the header when there is no changelog yet.
pub fn prepend_section(existing: Option<&str>, section: &str) -> String {
    let existing = existing.unwrap_or_default();
    if existing.trim().is_empty() {
        return format!("{HEADER}\n\n{section}");
    }

    match existing.find("\n## ") {
        Some(index) => {
            let (intro, rest) = existing.split_at(index + 1);
            format!("{intro}{section}\n{rest}")
        }
        None if existing.starts_with("## ") => format!("{section}\n{existing}"),
        None => format!("{}\n\n{section}", existing.trim_end()),
    }
}
