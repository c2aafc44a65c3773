//! Version propagation to dependent packages after a release
//!
//! Scans every other package's manifest across the four dependency kinds and
//! rewrites references to the released package with a caret range. A major
//! bump flowing through a strict runtime edge marks the dependent as needing
//! its own breaking release; the commit message's `Breaking:` prefix is what
//! carries that mark, and the dependent's later pipeline classifies it like
//! any other commit.

use crate::changelog::VersionBump;
use crate::core::error::TrainResult;
use crate::core::vcs::Git;
use crate::package::{DependencyKind, Workspace};

/// What a propagation pass touched
#[derive(Debug, Default)]
pub struct PropagationOutcome {
  /// Dependents whose manifests were rewritten
  pub updated: Vec<String>,
  /// Dependents recorded as requiring their own breaking release
  pub breaking: Vec<String>,
}

/// Rewrite dependents of the released package and commit the updates.
///
/// Prerelease runs never commit; the rewrites accumulate in the working tree
/// for a final commit step.
pub fn propagate_version(
  workspace: &mut Workspace,
  released_idx: usize,
  bump: VersionBump,
  git: &Git<'_>,
  prerelease: bool,
) -> TrainResult<PropagationOutcome> {
  let released = workspace.package(released_idx);
  let released_name = released.name.clone();
  let Some(new_version) = released.new_version.clone() else {
    // Nothing released, nothing to propagate
    return Ok(PropagationOutcome::default());
  };
  // Caret range: dependents accept newer compatible versions
  let range = format!("^{}", new_version);

  let mut outcome = PropagationOutcome::default();
  let root = workspace.root.clone();

  for idx in 0..workspace.packages.len() {
    if idx == released_idx {
      continue;
    }

    let dependent = workspace.package_mut(idx);
    let mut modified = false;
    let mut via_runtime = false;

    for kind in DependencyKind::ALL {
      if dependent.manifest.dependency_range(kind, &released_name).is_some() {
        dependent.manifest.set_dependency_range(kind, &released_name, &range);
        modified = true;
        via_runtime |= kind.is_breaking_edge();
      }
    }

    if !modified {
      continue;
    }

    dependent.save_manifest(&root)?;
    outcome.updated.push(dependent.name.clone());

    let cascades_breaking = bump == VersionBump::Major && via_runtime;
    if cascades_breaking {
      outcome.breaking.push(dependent.name.clone());
    }

    if !prerelease {
      let prefix = if cascades_breaking { "Breaking" } else { "Chore" };
      let message = format!("{}: upgrade {} to {}", prefix, released_name, range);
      git.commit_paths(&message, &[dependent.manifest_path()])?;
    }
  }

  Ok(outcome)
}
