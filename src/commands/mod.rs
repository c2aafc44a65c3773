pub mod plan;
pub mod run;

pub use plan::run_plan;
pub use run::run_release;

use crate::core::error::TrainResult;
use crate::core::vcs::Git;
use crate::package::Workspace;
use semver::Version;

/// Fill in each package's most recent release tag from the repository
pub(crate) fn resolve_last_tags(workspace: &mut Workspace, git: &Git<'_>) -> TrainResult<()> {
  for idx in 0..workspace.packages.len() {
    let name = workspace.package(idx).name.clone();
    let tags = git.list_tags(&name)?;
    workspace.package_mut(idx).last_tag = latest_release_tag(&tags, &name);
  }
  Ok(())
}

/// Pick the highest-versioned `{name}@{version}` tag, by semver rather than
/// lexical order
pub(crate) fn latest_release_tag(tags: &[String], name: &str) -> Option<String> {
  let prefix = format!("{}@", name);
  tags
    .iter()
    .filter_map(|tag| {
      let version = Version::parse(tag.strip_prefix(&prefix)?).ok()?;
      Some((version, tag.clone()))
    })
    .max_by(|a, b| a.0.cmp(&b.0))
    .map(|(_, tag)| tag)
}
