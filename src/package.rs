//! Package model: manifests, dependency kinds, workspace discovery
//!
//! Packages live one-per-directory under the configured packages dir, each
//! described by a `package.json`. The manifest keeps its raw JSON object so
//! unrelated fields survive a rewrite; typed accessors cover the fields the
//! release flow touches.

use crate::core::error::{ResultExt, TrainError, TrainResult};
use semver::Version;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// The four dependency tables a manifest may carry.
///
/// Only `Runtime` edges are breaking edges: a major bump of a runtime
/// dependency cascades as a breaking release to the dependent. Dev, optional
/// and peer references get their ranges rewritten but never queue a breaking
/// release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
  Runtime,
  Dev,
  Optional,
  Peer,
}

impl DependencyKind {
  pub const ALL: [DependencyKind; 4] = [
    DependencyKind::Runtime,
    DependencyKind::Dev,
    DependencyKind::Optional,
    DependencyKind::Peer,
  ];

  /// Key of the corresponding manifest table
  pub fn manifest_key(self) -> &'static str {
    match self {
      DependencyKind::Runtime => "dependencies",
      DependencyKind::Dev => "devDependencies",
      DependencyKind::Optional => "optionalDependencies",
      DependencyKind::Peer => "peerDependencies",
    }
  }

  /// Whether a major bump through this edge forces a breaking release
  pub fn is_breaking_edge(self) -> bool {
    matches!(self, DependencyKind::Runtime)
  }
}

/// A package.json, kept as a raw JSON object with typed accessors
#[derive(Debug, Clone)]
pub struct Manifest {
  raw: Map<String, Value>,
}

impl Manifest {
  pub fn parse(content: &str) -> TrainResult<Self> {
    let value: Value = serde_json::from_str(content)?;
    match value {
      Value::Object(raw) => Ok(Self { raw }),
      _ => Err(TrainError::message("package.json is not a JSON object")),
    }
  }

  pub fn name(&self) -> TrainResult<&str> {
    self
      .raw
      .get("name")
      .and_then(Value::as_str)
      .ok_or_else(|| TrainError::message("package.json is missing \"name\""))
  }

  pub fn version(&self) -> TrainResult<Version> {
    let raw = self
      .raw
      .get("version")
      .and_then(Value::as_str)
      .ok_or_else(|| TrainError::message("package.json is missing \"version\""))?;
    Ok(Version::parse(raw)?)
  }

  pub fn set_version(&mut self, version: &Version) {
    self.raw.insert("version".to_string(), Value::String(version.to_string()));
  }

  /// Range recorded for `name` under the given dependency table, if any
  pub fn dependency_range(&self, kind: DependencyKind, name: &str) -> Option<&str> {
    self
      .raw
      .get(kind.manifest_key())
      .and_then(Value::as_object)
      .and_then(|table| table.get(name))
      .and_then(Value::as_str)
  }

  /// Rewrite the range for an existing reference.
  ///
  /// Returns false when the table or the reference does not exist; a missing
  /// reference is never created.
  pub fn set_dependency_range(&mut self, kind: DependencyKind, name: &str, range: &str) -> bool {
    let Some(table) = self.raw.get_mut(kind.manifest_key()).and_then(Value::as_object_mut) else {
      return false;
    };
    match table.get_mut(name) {
      Some(entry) => {
        *entry = Value::String(range.to_string());
        true
      }
      None => false,
    }
  }

  /// Serialize with npm's formatting (2-space indent, trailing newline)
  pub fn to_json_string(&self) -> TrainResult<String> {
    let mut out = serde_json::to_string_pretty(&Value::Object(self.raw.clone()))?;
    out.push('\n');
    Ok(out)
  }
}

/// One releasable package in the workspace
#[derive(Debug, Clone)]
pub struct Package {
  pub name: String,
  /// Package directory, relative to the workspace root
  pub dir: PathBuf,
  pub manifest: Manifest,
  pub version: Version,
  /// Latest release tag (`<name>@<version>`), absent for first-time publishes
  pub last_tag: Option<String>,
  /// Set once the release pipeline bumps the version
  pub new_version: Option<Version>,
}

impl Package {
  /// True when the package has never been published (no release tag exists)
  pub fn is_unpublished(&self) -> bool {
    self.last_tag.is_none()
  }

  /// Manifest path relative to the workspace root
  pub fn manifest_path(&self) -> PathBuf {
    self.dir.join("package.json")
  }

  /// Changelog path relative to the workspace root
  pub fn changelog_path(&self) -> PathBuf {
    self.dir.join("CHANGELOG.md")
  }

  /// Persist the in-memory manifest to disk
  pub fn save_manifest(&self, workspace_root: &Path) -> TrainResult<()> {
    let path = workspace_root.join(self.manifest_path());
    fs::write(path, self.manifest.to_json_string()?)?;
    Ok(())
  }
}

/// All packages in the source tree, read once at run start
#[derive(Debug)]
pub struct Workspace {
  pub root: PathBuf,
  pub packages: Vec<Package>,
}

impl Workspace {
  /// Scan the packages dir and load every `package.json` found.
  ///
  /// Directories without a manifest are ignored. Last-release tags are filled
  /// in separately by the driver, which owns the git collaborator.
  pub fn discover(root: &Path, packages_dir: &Path) -> TrainResult<Self> {
    let scan_dir = root.join(packages_dir);
    if !scan_dir.is_dir() {
      return Err(TrainError::with_help(
        format!("Packages directory not found: {}", scan_dir.display()),
        "Set [workspace] packages_dir in train.toml to the directory holding your packages.",
      ));
    }

    let mut packages = Vec::new();
    let mut entries: Vec<_> = fs::read_dir(&scan_dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
      let manifest_path = entry.path().join("package.json");
      if !manifest_path.is_file() {
        continue;
      }

      let content = fs::read_to_string(&manifest_path)?;
      let manifest =
        Manifest::parse(&content).with_context(|| format!("While reading {}", manifest_path.display()))?;
      let name = manifest.name()?.to_string();
      let version = manifest.version()?;

      packages.push(Package {
        name,
        dir: packages_dir.join(entry.file_name()),
        manifest,
        version,
        last_tag: None,
        new_version: None,
      });
    }

    if packages.is_empty() {
      return Err(TrainError::message(format!(
        "No packages found under {}",
        scan_dir.display()
      )));
    }

    Ok(Self {
      root: root.to_path_buf(),
      packages,
    })
  }

  pub fn package(&self, idx: usize) -> &Package {
    &self.packages[idx]
  }

  pub fn package_mut(&mut self, idx: usize) -> &mut Package {
    &mut self.packages[idx]
  }

  pub fn index_of(&self, name: &str) -> Option<usize> {
    self.packages.iter().position(|p| p.name == name)
  }
}

/// Release tag for a package version (`<name>@<version>`)
pub fn release_tag(name: &str, version: &Version) -> String {
  format!("{}@{}", name, version)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn manifest(json: &str) -> Manifest {
    Manifest::parse(json).unwrap()
  }

  #[test]
  fn test_manifest_accessors() {
    let mut m = manifest(r#"{"name": "@scope/pkg-a", "version": "1.2.3", "dependencies": {"@scope/pkg-b": "^1.0.0"}}"#);
    assert_eq!(m.name().unwrap(), "@scope/pkg-a");
    assert_eq!(m.version().unwrap(), Version::new(1, 2, 3));
    assert_eq!(m.dependency_range(DependencyKind::Runtime, "@scope/pkg-b"), Some("^1.0.0"));
    assert_eq!(m.dependency_range(DependencyKind::Dev, "@scope/pkg-b"), None);

    m.set_version(&Version::new(2, 0, 0));
    assert_eq!(m.version().unwrap(), Version::new(2, 0, 0));
  }

  #[test]
  fn test_set_dependency_range_only_rewrites_existing() {
    let mut m = manifest(r#"{"name": "a", "version": "0.1.0", "devDependencies": {"b": "^1.0.0"}}"#);
    assert!(m.set_dependency_range(DependencyKind::Dev, "b", "^2.0.0"));
    assert_eq!(m.dependency_range(DependencyKind::Dev, "b"), Some("^2.0.0"));

    // No table and no entry: nothing is created
    assert!(!m.set_dependency_range(DependencyKind::Runtime, "b", "^2.0.0"));
    assert!(!m.set_dependency_range(DependencyKind::Dev, "c", "^2.0.0"));
  }

  #[test]
  fn test_manifest_roundtrip_preserves_unrelated_fields() {
    let m = manifest(r#"{"name": "a", "version": "0.1.0", "scripts": {"test": "jest"}}"#);
    let out = m.to_json_string().unwrap();
    assert!(out.contains("\"jest\""));
    assert!(out.ends_with('\n'));
  }

  #[test]
  fn test_dependency_kind_semantics() {
    assert!(DependencyKind::Runtime.is_breaking_edge());
    assert!(!DependencyKind::Dev.is_breaking_edge());
    assert!(!DependencyKind::Optional.is_breaking_edge());
    assert!(!DependencyKind::Peer.is_breaking_edge());
    assert_eq!(DependencyKind::Peer.manifest_key(), "peerDependencies");
  }

  #[test]
  fn test_release_tag_format() {
    assert_eq!(release_tag("@scope/pkg-a", &Version::new(2, 0, 0)), "@scope/pkg-a@2.0.0");
  }
}
