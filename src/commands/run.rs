//! The release run: strictly sequential pipelines over the publish order
//!
//! One pipeline per package, dependencies first. A skipped package (nothing
//! release-worthy) lets the run continue; any failure rolls back the failed
//! pipeline's local state and halts the whole run. Credentials issued for
//! the run are revoked on every exit path.

use crate::commands::plan::generate_release_plan;
use crate::commands::resolve_last_tags;
use crate::core::config::TrainConfig;
use crate::core::context::ReleaseContext;
use crate::core::error::{ConfigError, TrainError, TrainResult};
use crate::core::runner::SystemRunner;
use crate::core::vcs::Git;
use crate::graph::PackageGraph;
use crate::host::{Credentials, GithubHost, ReleaseHost};
use crate::package::Workspace;
use crate::pipeline::rollback::roll_back;
use crate::pipeline::tasks::release_pipeline;
use crate::pipeline::{PipelineOutcome, ReleaseEnv};
use crate::registry::Npm;
use crate::ui::{ConsoleReporter, Prompt, Reporter, StdinPrompt};
use std::env;
use std::path::PathBuf;

pub fn run_release(prerelease: bool, dry_run: bool) -> TrainResult<()> {
  let root = env::current_dir()?;
  let config = TrainConfig::load(&root)?;

  if dry_run {
    let plan = generate_release_plan(&root)?;
    print!("{}", plan.format_table());
    println!("\n⏭  Dry run: nothing was released.");
    return Ok(());
  }

  let runner = SystemRunner::new(&root);
  let git = Git::new(&runner, &root);
  let reporter = ConsoleReporter::new();
  let prompt = StdinPrompt;

  if git.has_uncommitted_changes()? {
    return Err(TrainError::with_help(
      "The working tree has uncommitted changes",
      "Commit or stash them before releasing.",
    ));
  }

  let mut workspace = Workspace::discover(&root, &config.workspace.packages_dir)?;
  resolve_last_tags(&mut workspace, &git)?;
  let graph = PackageGraph::build(&workspace)?;
  let order = graph.publish_order()?;

  let host = GithubHost::new(&config.remote.api_url, &config.remote.owner, &config.remote.repo)?;
  let credentials = acquire_credentials(prerelease, &host, &prompt, &reporter)?;

  let npm = Npm::new(&runner, &reporter, config.registry.command_retries);

  let env = ReleaseEnv {
    config: &config,
    git: &git,
    npm: &npm,
    host: &host,
    credentials: &credentials,
    prompt: &prompt,
    reporter: &reporter,
    prerelease,
  };

  let result = run_pipelines(&order, &mut workspace, &env);

  if let Err(err) = host.revoke_token(&credentials) {
    reporter.warn(&format!("could not revoke the session token: {}", err));
  }

  let released = result?;
  if released == 0 {
    println!("\n⏭  Nothing to release.");
  } else {
    println!("\n✅ Released {} package(s)", released);
  }
  Ok(())
}

fn run_pipelines(
  order: &[String],
  workspace: &mut Workspace,
  env: &ReleaseEnv<'_>,
) -> TrainResult<usize> {
  let mut released = 0;
  for name in order {
    let idx = workspace
      .index_of(name)
      .ok_or_else(|| TrainError::Config(ConfigError::PackageNotFound { name: name.clone() }))?;
    let mut ctx = ReleaseContext::new(idx, name);
    let mut pipeline = release_pipeline();

    match pipeline.execute(&mut ctx, workspace, env) {
      PipelineOutcome::Completed => released += 1,
      PipelineOutcome::SkippedNoRelease => {}
      PipelineOutcome::Failed(err) => {
        if let Err(rb_err) = roll_back(workspace, &ctx, env.git, env.reporter) {
          env.reporter.warn(&format!("rollback incomplete: {}", rb_err));
        }
        return Err(err.context(format!("releasing {}", name)));
      }
    }
  }

  if env.prerelease && released > 0 {
    commit_prerelease_versions(workspace, env)?;
  }
  Ok(released)
}

/// Prerelease pipelines leave version bumps and dependent range rewrites
/// uncommitted; one commit at the end of the run gathers them all.
fn commit_prerelease_versions(workspace: &Workspace, env: &ReleaseEnv<'_>) -> TrainResult<()> {
  let manifests: Vec<PathBuf> = workspace.packages.iter().map(|p| p.manifest_path()).collect();
  // Chore: keeps the bump commit from classifying as release-worthy on the
  // next pass
  env.git.commit_paths("Chore: prerelease version bumps", &manifests)
}

/// Token from the environment when present, otherwise an interactive
/// username/password/OTP exchange against the host. Prerelease task sets
/// never talk to the host, so those runs get inert credentials without
/// prompting.
fn acquire_credentials(
  prerelease: bool,
  host: &dyn ReleaseHost,
  prompt: &dyn Prompt,
  reporter: &dyn Reporter,
) -> TrainResult<Credentials> {
  if prerelease {
    return Ok(Credentials::from_token(""));
  }

  if let Ok(token) = env::var("GITHUB_TOKEN") {
    let token = token.trim();
    if !token.is_empty() {
      return Ok(Credentials::from_token(token));
    }
  }

  reporter.note("GitHub credentials are needed to create releases");
  let username = prompt.ask("GitHub username")?;
  let password = prompt.ask("GitHub password")?;
  let otp = prompt.ask("GitHub one-time password (leave blank if 2FA is off)")?;
  host.issue_token(&username, &password, &otp)
}
