//! npm invocations through the command runner
//!
//! Long-running commands (install, build scripts, publish) carry the
//! configured retry budget. A publish failure carrying npm's one-time-password
//! marker surfaces as `TrainError::OtpRetry` so the publish task can re-prompt
//! instead of failing hard.

use crate::core::error::{TrainError, TrainResult};
use crate::core::runner::{CommandRunner, ShellCommand, run_with_retry};
use crate::ui::Reporter;
use semver::Version;
use std::path::Path;

pub struct Npm<'r> {
  runner: &'r dyn CommandRunner,
  reporter: &'r dyn Reporter,
  /// Extra attempts for long-running commands
  retries: u32,
}

impl<'r> Npm<'r> {
  pub fn new(runner: &'r dyn CommandRunner, reporter: &'r dyn Reporter, retries: u32) -> Self {
    Self {
      runner,
      reporter,
      retries,
    }
  }

  fn npm(&self, dir: &Path) -> ShellCommand {
    ShellCommand::new("npm").current_dir(dir)
  }

  /// Install dependencies in `dir`
  pub fn install(&self, dir: &Path) -> TrainResult<()> {
    let cmd = self.npm(dir).arg("install");
    run_with_retry(self.runner, &cmd, self.retries, self.reporter)?;
    Ok(())
  }

  /// Write the bumped version into the manifest (no tag, no commit)
  pub fn bump_version(&self, dir: &Path, version: &Version) -> TrainResult<()> {
    let cmd = self
      .npm(dir)
      .args(["version", &version.to_string(), "--no-git-tag-version"]);
    self.runner.run(&cmd)?;
    Ok(())
  }

  /// Run a named package script
  pub fn run_script(&self, dir: &Path, script: &str) -> TrainResult<()> {
    let cmd = self.npm(dir).args(["run", script]);
    run_with_retry(self.runner, &cmd, self.retries, self.reporter)?;
    Ok(())
  }

  /// Publish the package in `dir`.
  ///
  /// `access` is forwarded for scoped packages; `otp` when the registry
  /// demands a one-time password.
  pub fn publish(&self, dir: &Path, access: Option<&str>, otp: Option<&str>) -> TrainResult<()> {
    let mut cmd = self.npm(dir).arg("publish");
    if let Some(level) = access {
      cmd = cmd.args(["--access", level]);
    }
    if let Some(code) = otp {
      cmd = cmd.args(["--otp", code]);
    }

    match run_with_retry(self.runner, &cmd, self.retries, self.reporter) {
      Ok(_) => Ok(()),
      Err(err) if err.is_otp_retry() => Err(TrainError::OtpRetry),
      Err(err) => Err(err),
    }
  }
}
