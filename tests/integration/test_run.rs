//! Tests for the `run` command surface that needs no registry or network

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_run_dry_run_changes_nothing() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.add_package("pkg-a", "@acme/core", "1.0.0", &[])?;
  workspace.add_package("pkg-b", "@acme/ui", "2.0.0", &[("@acme/core", "^1.0.0")])?;
  workspace.commit("Chore: add packages")?;
  let head_before = workspace.commit_change("pkg-a", "Fix: handle empty configuration")?;

  let output = run_release_train(&workspace.path, &["run", "--dry-run"])?;
  let stdout = stdout_of(&output);

  assert!(stdout.contains("Release Plan"));
  assert!(stdout.contains("Dry run"));

  // No tags, no commits, no working tree edits
  assert!(workspace.tags()?.is_empty());
  let head_after = git(&workspace.path, &["rev-parse", "HEAD"])?;
  assert_eq!(String::from_utf8_lossy(&head_after.stdout).trim(), head_before);
  let status = git(&workspace.path, &["status", "--porcelain"])?;
  assert!(String::from_utf8_lossy(&status.stdout).trim().is_empty());
  let manifest = workspace.read_file("packages/pkg-a/package.json")?;
  assert!(manifest.contains("\"version\": \"1.0.0\""));
  assert!(!workspace.file_exists("packages/pkg-a/CHANGELOG.md"));

  Ok(())
}

#[test]
fn test_run_refuses_dirty_working_tree() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.add_package("pkg-a", "@acme/core", "1.0.0", &[])?;
  workspace.commit("Chore: add package")?;

  // Leave an uncommitted edit behind
  std::fs::write(workspace.path.join("packages/pkg-a/notes.txt"), "wip")?;

  let output = run_release_train_raw(&workspace.path, &["run"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("uncommitted changes"));

  Ok(())
}

#[test]
fn test_run_fails_without_config() -> Result<()> {
  let temp = tempfile::TempDir::new()?;
  git(temp.path(), &["init"])?;

  let output = run_release_train_raw(temp.path(), &["run"])?;
  assert!(!output.status.success());
  // Config problems use the user-error exit code
  assert_eq!(output.status.code(), Some(1));

  Ok(())
}
