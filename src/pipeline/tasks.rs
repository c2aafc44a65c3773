//! Task sets for package release pipelines
//!
//! The full release pipeline: collect → derive → notes → install → build →
//! bump → changelog → commit → tag → publish → push/release → propagate →
//! cleanup. Prerelease runs skip the notes, changelog, tagging, committing
//! and host-release steps; version bumps and range rewrites accumulate
//! uncommitted until the driver commits them at the end of the run.

use crate::changelog::{self, Commit, NotesBuilder};
use crate::core::error::TrainError;
use crate::graph::propagate::propagate_version;
use crate::package::release_tag;
use crate::pipeline::{Pipeline, ReleaseEnv, Task};
use std::fs;

/// Prompts that keep rejecting one-time passwords eventually fail hard
const MAX_OTP_PROMPTS: u32 = 3;

/// Build the pipeline for one package. Gated tasks resolve against the run
/// environment when the pipeline executes.
pub fn release_pipeline() -> Pipeline {
  Pipeline::new(vec![
    collect_changes(),
    derive_version(),
    generate_notes().enabled_when(full_release_only),
    install_dependencies(),
    run_build_script(),
    apply_version_bump(),
    update_changelog().enabled_when(full_release_only),
    commit_release().enabled_when(full_release_only),
    tag_release().enabled_when(full_release_only),
    publish_package(),
    push_and_create_release().enabled_when(full_release_only),
    propagate_to_dependents(),
    clean_build_artifacts(),
  ])
}

fn full_release_only(env: &ReleaseEnv<'_>) -> bool {
  !env.prerelease
}

fn collect_changes() -> Task {
  Task::new("Collect changes since last release", |ctx, ws, env| {
    let pkg = ws.package(ctx.package_idx);
    let records = env.git.commits_since(pkg.last_tag.as_deref(), &pkg.dir)?;
    ctx.commits = records.iter().map(Commit::from_record).collect();

    if !changelog::is_release_worthy(&ctx.commits) {
      env.reporter.note("no release-worthy changes");
      ctx.skip_remaining = true;
    }
    Ok(())
  })
}

fn derive_version() -> Task {
  Task::new("Derive version bump", |ctx, ws, env| {
    let bump = changelog::derive_bump(&ctx.commits);
    ctx.bump = Some(bump);

    let pkg = ws.package(ctx.package_idx);
    let next = changelog::next_version(&pkg.version, bump, env.prerelease)?;
    ctx.tag_name = Some(release_tag(&pkg.name, &next));
    ctx.set_new_version(next)
  })
}

fn generate_notes() -> Task {
  Task::new("Generate release notes", |ctx, _ws, env| {
    let repo_url = env.config.remote.repo_url();
    let builder = NotesBuilder::new(&repo_url)
      .with_author_lookup(|sha| env.host.commit_author(env.credentials, sha).ok().flatten());
    ctx.notes = Some(builder.render(&ctx.commits));
    Ok(())
  })
}

fn install_dependencies() -> Task {
  Task::new("Install dependencies", |_ctx, ws, env| env.npm.install(&ws.root))
}

fn run_build_script() -> Task {
  Task::new("Run build script", |ctx, ws, env| {
    let Some(script) = env.config.workspace.build_script.as_deref() else {
      return Ok(());
    };
    let dir = ws.root.join(&ws.package(ctx.package_idx).dir);
    env.npm.run_script(&dir, script)
  })
}

fn apply_version_bump() -> Task {
  Task::new("Apply version bump", |ctx, ws, env| {
    let version = ctx.require_new_version()?.clone();
    let root = ws.root.clone();
    let pkg = ws.package_mut(ctx.package_idx);

    env.npm.bump_version(&root.join(&pkg.dir), &version)?;

    // Mirror the bump into the in-memory manifest so later steps and the
    // propagator see it
    pkg.manifest.set_version(&version);
    pkg.new_version = Some(version);
    pkg.save_manifest(&root)
  })
}

fn update_changelog() -> Task {
  Task::new("Update changelog", |ctx, ws, _env| {
    let version = ctx.require_new_version()?.clone();
    let notes = ctx.notes.clone().unwrap_or_default();
    let pkg = ws.package(ctx.package_idx);
    changelog::update_changelog_file(
      &ws.root,
      &pkg.changelog_path(),
      &version,
      &notes,
      pkg.is_unpublished(),
      chrono::Utc::now(),
    )?;
    Ok(())
  })
}

fn commit_release() -> Task {
  Task::new("Commit release", |ctx, ws, env| {
    let tag = ctx
      .tag_name
      .clone()
      .ok_or_else(|| TrainError::message("no tag name derived"))?;
    let pkg = ws.package(ctx.package_idx);
    // Chore: keeps the release commit itself from classifying as
    // release-worthy on the next pass
    env.git.commit_paths(
      &format!("Chore: release {}", tag),
      &[pkg.manifest_path(), pkg.changelog_path()],
    )
  })
}

fn tag_release() -> Task {
  Task::new("Tag release", |ctx, _ws, env| {
    let tag = ctx
      .tag_name
      .clone()
      .ok_or_else(|| TrainError::message("no tag name derived"))?;
    env.git.create_tag(&tag, &tag)?;
    ctx.tag_created = true;
    Ok(())
  })
}

fn publish_package() -> Task {
  Task::new("Publish to registry", |ctx, ws, env| {
    let dir = ws.root.join(&ws.package(ctx.package_idx).dir);
    let access = env.config.registry.access.as_deref();

    let mut otp: Option<String> = None;
    let mut prompts = 0;
    loop {
      match env.npm.publish(&dir, access, otp.as_deref()) {
        Ok(()) => return Ok(()),
        Err(TrainError::OtpRetry) => {
          prompts += 1;
          if prompts > MAX_OTP_PROMPTS {
            let err = TrainError::with_help(
              "Publish kept rejecting one-time passwords",
              "Check the authenticator clock and npm 2FA settings.",
            );
            ctx.publish_error = Some(err.to_string());
            return Err(err);
          }
          otp = Some(env.prompt.ask("npm one-time password")?);
        }
        Err(err) => {
          ctx.publish_error = Some(err.to_string());
          return Err(err);
        }
      }
    }
  })
}

fn push_and_create_release() -> Task {
  Task::new("Push and create release on GitHub", |ctx, _ws, env| {
    let tag = ctx
      .tag_name
      .clone()
      .ok_or_else(|| TrainError::message("no tag name derived"))?;
    env.git.push(true)?;

    let notes = ctx.notes.clone().unwrap_or_default();
    let release = env.host.create_release(env.credentials, &tag, &notes)?;
    match release.url {
      Some(url) => env.reporter.note(&format!("release {} created: {}", release.tag, url)),
      None => env.reporter.note(&format!("release {} created", release.tag)),
    }
    Ok(())
  })
}

fn propagate_to_dependents() -> Task {
  Task::new("Propagate version to dependents", |ctx, ws, env| {
    let bump = ctx
      .bump
      .ok_or_else(|| TrainError::message("no version bump derived"))?;
    let outcome = propagate_version(ws, ctx.package_idx, bump, env.git, env.prerelease)?;
    for name in &outcome.breaking {
      env.reporter.note(&format!("{} queued for a breaking release", name));
    }
    Ok(())
  })
}

fn clean_build_artifacts() -> Task {
  Task::new("Clean up build artifacts", |ctx, ws, _env| {
    let dist = ws.root.join(&ws.package(ctx.package_idx).dir).join("dist");
    match fs::remove_dir_all(&dist) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  })
  .always_run()
}
