//! Per-package release context, threaded through one pipeline run
//!
//! Exactly one pipeline ever sees a given context; tasks mutate its named
//! fields in sequence. `new_version` is write-once.

use crate::changelog::{Commit, VersionBump};
use crate::core::error::{TrainError, TrainResult};
use semver::Version;

/// The single mutable record for one package's pipeline
#[derive(Debug)]
pub struct ReleaseContext {
  /// Index of the package in the workspace package list
  pub package_idx: usize,
  pub package_name: String,

  /// Commits since the last release tag, oldest first
  pub commits: Vec<Commit>,

  /// Derived semver increment
  pub bump: Option<VersionBump>,

  /// Version being released; set at most once
  new_version: Option<Version>,

  /// Tag name for this release (`<name>@<version>`)
  pub tag_name: Option<String>,

  /// True once the tag exists in git; drives rollback's tag deletion
  pub tag_created: bool,

  /// Rendered release notes
  pub notes: Option<String>,

  /// Publish failure message, recorded for operator display
  pub publish_error: Option<String>,

  /// Set when the package has no release-worthy changes; remaining tasks
  /// no-op except those marked always-run
  pub skip_remaining: bool,
}

impl ReleaseContext {
  pub fn new(package_idx: usize, package_name: impl Into<String>) -> Self {
    Self {
      package_idx,
      package_name: package_name.into(),
      commits: Vec::new(),
      bump: None,
      new_version: None,
      tag_name: None,
      tag_created: false,
      notes: None,
      publish_error: None,
      skip_remaining: false,
    }
  }

  /// Record the version being released. Write-once.
  pub fn set_new_version(&mut self, version: Version) -> TrainResult<()> {
    if self.new_version.is_some() {
      return Err(TrainError::message(format!(
        "new version already set for '{}'",
        self.package_name
      )));
    }
    self.new_version = Some(version);
    Ok(())
  }

  /// The new version, or an error when a task runs out of order
  pub fn require_new_version(&self) -> TrainResult<&Version> {
    self
      .new_version
      .as_ref()
      .ok_or_else(|| TrainError::message(format!("no version derived yet for '{}'", self.package_name)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new_version_is_write_once() {
    let mut ctx = ReleaseContext::new(0, "@scope/pkgA");
    ctx.set_new_version(Version::new(1, 1, 0)).unwrap();
    assert!(ctx.set_new_version(Version::new(1, 2, 0)).is_err());
    assert_eq!(ctx.require_new_version().unwrap(), &Version::new(1, 1, 0));
  }

  #[test]
  fn test_require_new_version_errors_before_set() {
    let ctx = ReleaseContext::new(0, "@scope/pkgA");
    assert!(ctx.require_new_version().is_err());
  }
}
