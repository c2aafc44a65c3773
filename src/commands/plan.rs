//! Release planning: preview derived bumps without touching anything
//!
//! The plan command:
//! 1. Loads train.toml and discovers workspace packages
//! 2. Resolves each package's last release tag
//! 3. Classifies commits since that tag and derives a version bump
//! 4. Computes the publish order from the dependency graph
//! 5. Outputs the plan (table or JSON)
//!
//! The preview is static: during an actual run, an earlier package's release
//! adds propagation commits that can raise a later package's bump, so treat
//! the listed versions as lower bounds.

use crate::changelog::{self, Commit, CommitTag, VersionBump};
use crate::commands::resolve_last_tags;
use crate::core::config::TrainConfig;
use crate::core::error::{ConfigError, TrainError, TrainResult};
use crate::core::runner::SystemRunner;
use crate::core::vcs::Git;
use crate::graph::PackageGraph;
use crate::package::Workspace;
use serde::Serialize;
use std::env;
use std::path::Path;

/// Planned release for a single package
#[derive(Debug, Clone, Serialize)]
pub struct PackagePlan {
  pub name: String,
  pub current_version: String,
  /// Absent when nothing release-worthy happened
  pub next_version: Option<String>,
  pub bump: Option<VersionBump>,
  /// Human summary of what drives the bump
  pub reason: String,
  pub has_changes: bool,
}

/// Complete plan for the workspace
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
  pub packages: Vec<PackagePlan>,
  /// Dependencies first
  pub publish_order: Vec<String>,
}

impl ReleasePlan {
  pub fn format_table(&self) -> String {
    let mut output = String::from("📦 Release Plan\n\n");

    if !self.packages.iter().any(|p| p.has_changes) {
      output.push_str("No packages need to be released.\n");
      return output;
    }

    output.push_str("Package                  Current    Next       Reason\n");
    output.push_str("──────────────────────────────────────────────────────────────────────\n");

    for plan in &self.packages {
      output.push_str(&format!(
        "{:<24} {:<10} {:<10} {}\n",
        plan.name,
        plan.current_version,
        plan.next_version.as_deref().unwrap_or("-"),
        plan.reason
      ));
    }

    output.push_str(&format!("\nPublish order: {}\n", self.publish_order.join(" → ")));
    output
  }

  pub fn to_json(&self) -> TrainResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }
}

/// Generate a plan without printing (for the dry-run path as well)
pub fn generate_release_plan(root: &Path) -> TrainResult<ReleasePlan> {
  let config = TrainConfig::load(root)?;
  let runner = SystemRunner::new(root);
  let git = Git::new(&runner, root);

  let mut workspace = Workspace::discover(root, &config.workspace.packages_dir)?;
  resolve_last_tags(&mut workspace, &git)?;

  let graph = PackageGraph::build(&workspace)?;
  let publish_order = graph.publish_order()?;

  let mut packages = Vec::new();
  for name in &publish_order {
    let idx = workspace
      .index_of(name)
      .ok_or_else(|| TrainError::Config(ConfigError::PackageNotFound { name: name.clone() }))?;
    let pkg = workspace.package(idx);

    let records = git.commits_since(pkg.last_tag.as_deref(), &pkg.dir)?;
    let commits: Vec<Commit> = records.iter().map(Commit::from_record).collect();

    let plan = if changelog::is_release_worthy(&commits) {
      let bump = changelog::derive_bump(&commits);
      let next = changelog::next_version(&pkg.version, bump, false)?;
      PackagePlan {
        name: name.clone(),
        current_version: pkg.version.to_string(),
        next_version: Some(next.to_string()),
        bump: Some(bump),
        reason: describe_commits(&commits),
        has_changes: true,
      }
    } else {
      PackagePlan {
        name: name.clone(),
        current_version: pkg.version.to_string(),
        next_version: None,
        bump: None,
        reason: "no release-worthy commits".to_string(),
        has_changes: false,
      }
    };
    packages.push(plan);
  }

  Ok(ReleasePlan {
    packages,
    publish_order,
  })
}

pub fn run_plan(json: bool) -> TrainResult<()> {
  let root = env::current_dir()?;
  let plan = generate_release_plan(&root)?;

  if json {
    println!("{}", plan.to_json()?);
  } else {
    print!("{}", plan.format_table());
  }
  Ok(())
}

fn describe_commits(commits: &[Commit]) -> String {
  let mut breaking = 0;
  let mut fixes = 0;
  let mut features = 0;
  for commit in commits {
    match commit.tag {
      CommitTag::Breaking => breaking += 1,
      CommitTag::Fix => fixes += 1,
      CommitTag::New | CommitTag::Update => features += 1,
      _ => {}
    }
  }

  let mut parts = Vec::new();
  if breaking > 0 {
    parts.push(plural(breaking, "breaking change"));
  }
  if features > 0 {
    parts.push(plural(features, "feature"));
  }
  if fixes > 0 {
    parts.push(plural(fixes, "fix"));
  }
  parts.join(", ")
}

fn plural(count: usize, noun: &str) -> String {
  if count == 1 {
    format!("{} {}", count, noun)
  } else if noun.ends_with('x') {
    format!("{} {}es", count, noun)
  } else {
    format!("{} {}s", count, noun)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn commit(title: &str) -> Commit {
    Commit {
      sha: "a".repeat(40),
      title: title.to_string(),
      tag: CommitTag::parse(title),
      issue_ids: Vec::new(),
    }
  }

  #[test]
  fn test_describe_commits_counts_by_kind() {
    let commits = vec![
      commit("Breaking: drop old API"),
      commit("Fix: crash on empty input"),
      commit("Fix: off-by-one in paging"),
      commit("New: add grid widget"),
      commit("Docs: update readme"),
    ];
    assert_eq!(describe_commits(&commits), "1 breaking change, 1 feature, 2 fixes");
  }

  #[test]
  fn test_describe_commits_ignores_unworthy_kinds() {
    let commits = vec![commit("Docs: typo"), commit("Chore: bump deps")];
    assert_eq!(describe_commits(&commits), "");
  }
}
