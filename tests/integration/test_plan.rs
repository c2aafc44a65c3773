//! Tests for the `plan` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_plan_lists_release_worthy_packages() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.add_package("pkg-a", "@acme/core", "1.0.0", &[])?;
  workspace.add_package("pkg-b", "@acme/docs", "1.0.0", &[])?;
  workspace.commit("Chore: add packages")?;

  workspace.commit_change("pkg-a", "Fix: resolve crash on empty input")?;
  workspace.commit_change("pkg-b", "Docs: rewrite the intro")?;

  let output = run_release_train(&workspace.path, &["plan"])?;
  let stdout = stdout_of(&output);

  assert!(stdout.contains("Release Plan"));
  assert!(stdout.contains("@acme/core"));
  assert!(stdout.contains("1.0.1"));
  // Docs-only commits never drive a release
  assert!(stdout.contains("no release-worthy commits"));

  Ok(())
}

#[test]
fn test_plan_json_output() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.add_package("pkg-a", "@acme/core", "1.2.3", &[])?;
  workspace.add_package("pkg-b", "@acme/ui", "0.5.0", &[("@acme/core", "^1.2.3")])?;
  workspace.commit("Chore: add packages")?;

  workspace.commit_change("pkg-a", "New: add validation helpers")?;

  let output = run_release_train(&workspace.path, &["plan", "--json"])?;
  let plan: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;

  let order: Vec<&str> = plan["publish_order"]
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v.as_str().unwrap())
    .collect();
  // Dependencies publish first
  assert_eq!(order, vec!["@acme/core", "@acme/ui"]);

  let core = plan["packages"]
    .as_array()
    .unwrap()
    .iter()
    .find(|p| p["name"] == "@acme/core")
    .unwrap();
  assert_eq!(core["bump"], "minor");
  assert_eq!(core["next_version"], "1.3.0");
  assert_eq!(core["has_changes"], true);

  Ok(())
}

#[test]
fn test_plan_breaking_commit_majors() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.add_package("pkg-a", "@acme/core", "1.2.3", &[])?;
  workspace.commit("Chore: add package")?;

  workspace.commit_change("pkg-a", "Breaking: remove the legacy option")?;
  workspace.commit_change("pkg-a", "Fix: follow-up cleanup")?;

  let output = run_release_train(&workspace.path, &["plan", "--json"])?;
  let plan: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;

  let core = &plan["packages"].as_array().unwrap()[0];
  assert_eq!(core["bump"], "major");
  assert_eq!(core["next_version"], "2.0.0");

  Ok(())
}

#[test]
fn test_plan_counts_only_commits_since_last_tag() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.add_package("pkg-a", "@acme/core", "1.0.0", &[])?;
  workspace.commit("New: first version of core")?;
  workspace.tag("@acme/core@1.0.0")?;

  workspace.commit_change("pkg-a", "Docs: mention the new API")?;

  let output = run_release_train(&workspace.path, &["plan", "--json"])?;
  let plan: serde_json::Value = serde_json::from_str(&stdout_of(&output))?;

  // The pre-tag New: commit is already released; only the docs commit counts
  let core = &plan["packages"].as_array().unwrap()[0];
  assert_eq!(core["has_changes"], false);

  Ok(())
}

#[test]
fn test_plan_fails_without_config() -> Result<()> {
  let temp = tempfile::TempDir::new()?;
  git(temp.path(), &["init"])?;

  let output = run_release_train_raw(temp.path(), &["plan"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("train.toml"));

  Ok(())
}

#[test]
fn test_plan_rejects_dependency_cycles() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.add_package("pkg-a", "@acme/a", "1.0.0", &[("@acme/b", "^1.0.0")])?;
  workspace.add_package("pkg-b", "@acme/b", "1.0.0", &[("@acme/a", "^1.0.0")])?;
  workspace.commit("Chore: add packages")?;

  let output = run_release_train_raw(&workspace.path, &["plan"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("cycle"));

  Ok(())
}
