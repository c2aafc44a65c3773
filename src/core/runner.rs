//! Command runner: external processes with uniform, caller-selected retry
//!
//! Every version-control and package-manager invocation goes through
//! [`CommandRunner`]. The trait exists so tests can script outputs without
//! spawning processes. Retry policy makes no transient/permanent distinction;
//! callers pick the budget (0 for quick queries, 2 for build/publish steps).

use crate::core::error::{CommandError, TrainError, TrainResult};
use crate::ui::Reporter;
use std::path::PathBuf;
use std::process::Command;

/// A command to execute: program, arguments, working directory
#[derive(Debug, Clone)]
pub struct ShellCommand {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
}

impl ShellCommand {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Render as a single display string for error messages
  pub fn display(&self) -> String {
    let mut line = self.program.clone();
    for arg in &self.args {
      line.push(' ');
      line.push_str(arg);
    }
    line
  }
}

/// Captured output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
  pub stdout: String,
  pub stderr: String,
}

/// Executes external processes
pub trait CommandRunner {
  /// Run a command to completion.
  ///
  /// Non-zero exit yields `TrainError::Command` carrying the exit code and
  /// stderr.
  fn run(&self, cmd: &ShellCommand) -> TrainResult<CommandOutput>;
}

/// Runs commands via std::process with an isolated environment
pub struct SystemRunner {
  /// Default working directory for commands without an explicit one
  root: PathBuf,
}

impl SystemRunner {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }
}

impl CommandRunner for SystemRunner {
  fn run(&self, cmd: &ShellCommand) -> TrainResult<CommandOutput> {
    let mut process = Command::new(&cmd.program);
    process.args(&cmd.args);
    process.current_dir(cmd.cwd.as_deref().unwrap_or(&self.root));

    // Isolated environment (don't trust global config)
    process.env_clear();
    for var in ["PATH", "HOME", "USER", "LANG", "TMPDIR"] {
      if let Ok(value) = std::env::var(var) {
        process.env(var, value);
      }
    }

    let output = process
      .output()
      .map_err(|e| TrainError::message(format!("Failed to execute {}: {}", cmd.program, e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
      return Err(TrainError::Command(CommandError {
        command: cmd.display(),
        exit_code: output.status.code(),
        stderr,
      }));
    }

    Ok(CommandOutput { stdout, stderr })
  }
}

/// Run a command with up to `max_retries` additional attempts on failure.
///
/// Each failure that will be retried is reported to the observability sink
/// with the attempt number and the retries remaining. When the budget is
/// exhausted the last failure is surfaced, wrapped in `RetryExhausted` if any
/// retries were configured.
pub fn run_with_retry(
  runner: &dyn CommandRunner,
  cmd: &ShellCommand,
  max_retries: u32,
  reporter: &dyn Reporter,
) -> TrainResult<CommandOutput> {
  let mut attempt = 0;
  loop {
    attempt += 1;
    match runner.run(cmd) {
      Ok(output) => return Ok(output),
      Err(err) => {
        if attempt > max_retries {
          if max_retries == 0 {
            return Err(err);
          }
          return Err(TrainError::RetryExhausted {
            attempts: attempt,
            source: Box::new(err),
          });
        }
        reporter.retry_attempt(&cmd.display(), attempt, max_retries - attempt + 1, &err);
      }
    }
  }
}
