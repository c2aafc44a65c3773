//! Changelog and semver derivation from commit history
//!
//! Commits are classified by the leading colon-delimited token of their title
//! (`Fix: resolve crash` → `Fix`). Three fixed sections partition the
//! release-note output; the most severe category present picks the version
//! bump. A commit set with no user-facing tag is not release worthy and the
//! owning pipeline skips the remaining release steps.

use crate::core::error::{ResultExt, TrainResult};
use crate::core::vcs::CommitRecord;
use chrono::{DateTime, Utc};
use semver::{Prerelease, Version};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Category label parsed from a commit title's leading token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitTag {
  Breaking,
  Fix,
  Docs,
  New,
  Update,
  /// Unrecognized leading token, retained verbatim; contributes to no section
  Other(String),
}

impl CommitTag {
  /// Parse the leading `<token>:` of a commit title.
  ///
  /// Titles without a colon-delimited token classify as `Other("")`.
  pub fn parse(title: &str) -> Self {
    let Some((token, _)) = title.split_once(':') else {
      return CommitTag::Other(String::new());
    };
    let token = token.trim();
    match token.to_ascii_lowercase().as_str() {
      "breaking" => CommitTag::Breaking,
      "fix" => CommitTag::Fix,
      "docs" => CommitTag::Docs,
      "new" => CommitTag::New,
      "update" => CommitTag::Update,
      _ => CommitTag::Other(token.to_string()),
    }
  }

  /// User-facing change tags warrant a release; Docs and unrecognized do not
  pub fn is_release_worthy(&self) -> bool {
    matches!(self, CommitTag::Breaking | CommitTag::Fix | CommitTag::New | CommitTag::Update)
  }
}

/// A classified commit, immutable once extracted from history
#[derive(Debug, Clone)]
pub struct Commit {
  pub sha: String,
  pub title: String,
  pub tag: CommitTag,
  /// Issue ids referenced by `Fix #N` / `Close #N` lines in the body
  pub issue_ids: Vec<u64>,
}

impl Commit {
  pub fn from_record(record: &CommitRecord) -> Self {
    Self {
      sha: record.sha.clone(),
      tag: CommitTag::parse(&record.title),
      issue_ids: scan_issue_ids(&record.body),
      title: record.title.clone(),
    }
  }

  /// Short SHA used in rendered changelog lines
  pub fn short_sha(&self) -> &str {
    let end = self.sha.len().min(10);
    &self.sha[..end]
  }
}

/// Scan commit body lines for `Fix #<n>` / `Close #<n>` (case-insensitive)
fn scan_issue_ids(body: &str) -> Vec<u64> {
  let mut ids = Vec::new();
  for line in body.lines() {
    let mut prev: Option<String> = None;
    for word in line.split_whitespace() {
      if let Some(rest) = word.strip_prefix('#') {
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if let (Some(keyword), Ok(id)) = (prev.as_deref(), digits.parse::<u64>()) {
          if (keyword == "fix" || keyword == "close") && !ids.contains(&id) {
            ids.push(id);
          }
        }
      }
      prev = Some(word.to_ascii_lowercase());
    }
  }
  ids
}

/// Version bump kind, determined by the most severe category present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
  Major,
  Minor,
  Patch,
}

impl VersionBump {
  /// Apply bump to a semver version
  pub fn apply(self, version: &Version) -> Version {
    match self {
      VersionBump::Major => Version::new(version.major + 1, 0, 0),
      VersionBump::Minor => Version::new(version.major, version.minor + 1, 0),
      VersionBump::Patch => Version::new(version.major, version.minor, version.patch + 1),
    }
  }
}

impl fmt::Display for VersionBump {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionBump::Major => write!(f, "major"),
      VersionBump::Minor => write!(f, "minor"),
      VersionBump::Patch => write!(f, "patch"),
    }
  }
}

/// Derive the bump from a commit set: Breaking → major, New/Update → minor,
/// anything else → patch
pub fn derive_bump(commits: &[Commit]) -> VersionBump {
  if commits.iter().any(|c| c.tag == CommitTag::Breaking) {
    VersionBump::Major
  } else if commits.iter().any(|c| matches!(c.tag, CommitTag::New | CommitTag::Update)) {
    VersionBump::Minor
  } else {
    VersionBump::Patch
  }
}

/// A commit set warrants a release only with at least one user-facing tag
pub fn is_release_worthy(commits: &[Commit]) -> bool {
  commits.iter().any(|c| c.tag.is_release_worthy())
}

/// Next version for a release or prerelease.
///
/// A prerelease on top of an existing prerelease increments its numeric
/// suffix (`2.0.0-beta.1` → `2.0.0-beta.2`); otherwise the bump applies and
/// gains a `-beta.1` suffix.
pub fn next_version(current: &Version, bump: VersionBump, prerelease: bool) -> TrainResult<Version> {
  if !prerelease {
    return Ok(bump.apply(current));
  }

  if !current.pre.is_empty() {
    let pre = current.pre.as_str();
    let (stem, counter) = match pre.rsplit_once('.') {
      Some((stem, n)) if n.chars().all(|c| c.is_ascii_digit()) => (stem.to_string(), n.parse::<u64>().unwrap_or(0)),
      _ => (pre.to_string(), 0),
    };
    let mut next = Version::new(current.major, current.minor, current.patch);
    next.pre = Prerelease::new(&format!("{}.{}", stem, counter + 1))?;
    return Ok(next);
  }

  let base = Version::new(current.major, current.minor, current.patch);
  let mut next = bump.apply(&base);
  next.pre = Prerelease::new("beta.1")?;
  Ok(next)
}

/// The fixed changelog sections, in render order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
  Breaking,
  Fixes,
  Features,
}

impl SectionKind {
  pub const ORDER: [SectionKind; 3] = [SectionKind::Breaking, SectionKind::Fixes, SectionKind::Features];

  pub fn title(self) -> &'static str {
    match self {
      SectionKind::Breaking => "Breaking Changes",
      SectionKind::Fixes => "Bug fixes / Improvements",
      SectionKind::Features => "New features",
    }
  }

  /// Fixed category membership; unmatched tags belong to no section
  pub fn accepts(self, tag: &CommitTag) -> bool {
    match self {
      SectionKind::Breaking => matches!(tag, CommitTag::Breaking),
      SectionKind::Fixes => matches!(tag, CommitTag::Docs | CommitTag::Fix),
      SectionKind::Features => matches!(tag, CommitTag::New | CommitTag::Update),
    }
  }
}

/// A rendered changelog section, built fresh per release
#[derive(Debug)]
pub struct ChangelogSection {
  pub title: &'static str,
  pub lines: Vec<String>,
}

/// Renders release notes with best-effort author enrichment.
///
/// `author_of` resolves a commit SHA to a display name; lookup failures fall
/// back silently to a line without an author.
pub struct NotesBuilder<'a> {
  repo_url: &'a str,
  author_of: Box<dyn Fn(&str) -> Option<String> + 'a>,
}

impl<'a> NotesBuilder<'a> {
  pub fn new(repo_url: &'a str) -> Self {
    Self {
      repo_url,
      author_of: Box::new(|_| None),
    }
  }

  pub fn with_author_lookup(mut self, lookup: impl Fn(&str) -> Option<String> + 'a) -> Self {
    self.author_of = Box::new(lookup);
    self
  }

  /// Partition commits into the fixed sections, preserving input order
  pub fn sections(&self, commits: &[Commit]) -> Vec<ChangelogSection> {
    SectionKind::ORDER
      .iter()
      .filter_map(|kind| {
        let lines: Vec<String> = commits
          .iter()
          .filter(|c| kind.accepts(&c.tag))
          .map(|c| self.render_line(c))
          .collect();
        if lines.is_empty() {
          None
        } else {
          Some(ChangelogSection {
            title: kind.title(),
            lines,
          })
        }
      })
      .collect()
  }

  /// Render the full release notes (empty sections omitted)
  pub fn render(&self, commits: &[Commit]) -> String {
    let mut out = String::new();
    for section in self.sections(commits) {
      if !out.is_empty() {
        out.push('\n');
      }
      out.push_str(&format!("## {}\n\n", section.title));
      for line in &section.lines {
        out.push_str(line);
        out.push('\n');
      }
    }
    out
  }

  fn render_line(&self, commit: &Commit) -> String {
    let mut line = format!(
      "* [{}]({}/commit/{}) {}",
      commit.short_sha(),
      self.repo_url,
      commit.sha,
      commit.title
    );
    if let Some(author) = (self.author_of)(&commit.sha) {
      line.push_str(&format!(" ({})", author));
    }
    for id in &commit.issue_ids {
      line.push_str(&format!(" ([#{}]({}/issues/{}))", id, self.repo_url, id));
    }
    line
  }
}

/// Prepend a release section to a package changelog.
///
/// Already-published packages get the new section above the existing content;
/// first-time publishes get a fresh file with a placeholder note.
pub fn update_changelog_file(
  workspace_root: &Path,
  changelog_path: &Path,
  version: &Version,
  notes: &str,
  first_publish: bool,
  now: DateTime<Utc>,
) -> TrainResult<PathBuf> {
  let absolute = workspace_root.join(changelog_path);
  let heading = format!("# {} ({})", version, now.format("%B %-d, %Y"));

  let content = if first_publish {
    format!("{}\n\nInitial release\n", heading)
  } else {
    let existing = if absolute.exists() {
      fs::read_to_string(&absolute).context("While reading the changelog")?
    } else {
      String::new()
    };
    format!("{}\n\n{}\n{}", heading, notes, existing)
  };

  fs::write(&absolute, content).context("While writing the changelog")?;
  Ok(changelog_path.to_path_buf())
}
