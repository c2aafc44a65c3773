//! Rollback after a failed pipeline, before the run halts
//!
//! Discards uncommitted working-tree and index state, deletes any tag the
//! failing pipeline created, and sweeps build artifacts out of every package
//! directory. Releases completed earlier in the run are already pushed and
//! published and stay untouched. Individual cleanup failures are reported
//! and skipped; the original task error always reaches the user.

use crate::core::context::ReleaseContext;
use crate::core::error::TrainResult;
use crate::core::vcs::Git;
use crate::package::Workspace;
use crate::ui::Reporter;
use std::fs;
use std::io;
use std::path::Path;

/// Directories swept from every package on rollback. Manifests may have been
/// rewritten by a bump or a shared install step, the reset takes care of
/// those; only generated trees need removing by hand.
const ARTIFACT_DIRS: &[&str] = &["node_modules", "dist"];

pub fn roll_back(
  workspace: &Workspace,
  ctx: &ReleaseContext,
  git: &Git<'_>,
  reporter: &dyn Reporter,
) -> TrainResult<()> {
  reporter.note(&format!("rolling back {}", ctx.package_name));

  // A publish cannot be undone; the operator has to check the registry
  if let Some(publish_error) = &ctx.publish_error {
    reporter.warn(&format!(
      "publish of {} failed and may have partially completed on the registry: {}",
      ctx.package_name, publish_error
    ));
  }

  git.reset_hard()?;

  if ctx.tag_created {
    if let Some(tag) = &ctx.tag_name {
      if let Err(err) = git.delete_tag(tag) {
        reporter.warn(&format!("could not delete tag {}: {}", tag, err));
      }
    }
  }

  for pkg in &workspace.packages {
    let dir = workspace.root.join(&pkg.dir);
    for artifact in ARTIFACT_DIRS {
      if let Err(err) = remove_dir_if_present(&dir.join(artifact)) {
        reporter.warn(&format!("could not remove {}/{}: {}", pkg.name, artifact, err));
      }
    }
  }
  // Root-level install artifacts from a shared lockfile
  if let Err(err) = remove_dir_if_present(&workspace.root.join("node_modules")) {
    reporter.warn(&format!("could not remove node_modules: {}", err));
  }

  Ok(())
}

fn remove_dir_if_present(path: &Path) -> io::Result<()> {
  match fs::remove_dir_all(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e),
  }
}
