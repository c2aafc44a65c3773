//! Pipeline executor: ordered tasks over a shared per-package context
//!
//! State machine per pipeline: Pending → Running → {Completed | Skipped |
//! Failed}. Tasks run strictly in declared order. When the context's skip
//! flag is set, tasks no-op unless marked always-run (the final cleanup). A
//! task error fails the pipeline immediately; nothing after it runs, not
//! even cleanup, and the driver rolls back and halts the whole run.

pub mod rollback;
pub mod tasks;

use crate::core::config::TrainConfig;
use crate::core::context::ReleaseContext;
use crate::core::error::{TrainError, TrainResult};
use crate::core::vcs::Git;
use crate::host::{Credentials, ReleaseHost};
use crate::package::Workspace;
use crate::registry::Npm;
use crate::ui::{Prompt, Reporter};

/// Collaborators shared by every task in a run.
///
/// Read-only from the tasks' perspective; the mutable state lives in the
/// `ReleaseContext` and the `Workspace` passed alongside.
pub struct ReleaseEnv<'a> {
  pub config: &'a TrainConfig,
  pub git: &'a Git<'a>,
  pub npm: &'a Npm<'a>,
  pub host: &'a dyn ReleaseHost,
  pub credentials: &'a Credentials,
  pub prompt: &'a dyn Prompt,
  pub reporter: &'a dyn Reporter,
  pub prerelease: bool,
}

type TaskFn = Box<dyn Fn(&mut ReleaseContext, &mut Workspace, &ReleaseEnv<'_>) -> TrainResult<()>>;

/// One step of a package pipeline. Immutable value object.
pub struct Task {
  pub title: &'static str,
  run: TaskFn,
  enabled: Option<Box<dyn Fn(&ReleaseEnv<'_>) -> bool>>,
  /// Runs even when the context's skip flag is set
  pub always_run: bool,
}

impl Task {
  pub fn new(
    title: &'static str,
    run: impl Fn(&mut ReleaseContext, &mut Workspace, &ReleaseEnv<'_>) -> TrainResult<()> + 'static,
  ) -> Self {
    Self {
      title,
      run: Box::new(run),
      enabled: None,
      always_run: false,
    }
  }

  /// Gate the task behind a predicate on the run environment
  pub fn enabled_when(mut self, predicate: impl Fn(&ReleaseEnv<'_>) -> bool + 'static) -> Self {
    self.enabled = Some(Box::new(predicate));
    self
  }

  /// Mark the task to run even after the skip flag is set
  pub fn always_run(mut self) -> Self {
    self.always_run = true;
    self
  }

  fn is_enabled(&self, env: &ReleaseEnv<'_>) -> bool {
    self.enabled.as_ref().map(|p| p(env)).unwrap_or(true)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
  Pending,
  Running,
  Completed,
  Skipped,
  Failed,
}

/// How a pipeline ended, propagated to the driver without sentinel values
#[derive(Debug)]
pub enum PipelineOutcome {
  Completed,
  /// No release-worthy changes; the run continues with the next package
  SkippedNoRelease,
  /// A task failed; the driver rolls back and halts the run
  Failed(TrainError),
}

/// Ordered task sequence for one package's release attempt
pub struct Pipeline {
  tasks: Vec<Task>,
  state: PipelineState,
}

impl Pipeline {
  pub fn new(tasks: Vec<Task>) -> Self {
    Self {
      tasks,
      state: PipelineState::Pending,
    }
  }

  /// Run the tasks in order against the context.
  ///
  /// A pipeline executes at most once; the context must be the one created
  /// for this pipeline and is visible to no other pipeline run.
  pub fn execute(&mut self, ctx: &mut ReleaseContext, workspace: &mut Workspace, env: &ReleaseEnv<'_>) -> PipelineOutcome {
    if self.state != PipelineState::Pending {
      return PipelineOutcome::Failed(TrainError::message(format!(
        "pipeline for '{}' already executed",
        ctx.package_name
      )));
    }
    self.state = PipelineState::Running;
    env.reporter.pipeline_started(&ctx.package_name, self.tasks.len());

    for task in &self.tasks {
      let blocked = ctx.skip_remaining && !task.always_run;
      if blocked || !task.is_enabled(env) {
        env.reporter.task_skipped(task.title);
        continue;
      }

      env.reporter.task_started(task.title);
      match (task.run)(ctx, workspace, env) {
        Ok(()) => env.reporter.task_completed(task.title),
        Err(err) => {
          self.state = PipelineState::Failed;
          let outcome = PipelineOutcome::Failed(err);
          env.reporter.pipeline_finished(&ctx.package_name, &outcome);
          return outcome;
        }
      }
    }

    let outcome = if ctx.skip_remaining {
      self.state = PipelineState::Skipped;
      PipelineOutcome::SkippedNoRelease
    } else {
      self.state = PipelineState::Completed;
      PipelineOutcome::Completed
    };
    env.reporter.pipeline_finished(&ctx.package_name, &outcome);
    outcome
  }
}

#[cfg(test)]
pub(crate) mod testutil {
  //! Shared fakes for pipeline-level tests

  use super::*;
  use crate::core::error::TrainResult;
  use crate::core::runner::{CommandOutput, CommandRunner, ShellCommand};
  use crate::host::CreatedRelease;
  use crate::package::{Manifest, Package};
  use semver::Version;
  use std::cell::RefCell;
  use std::path::PathBuf;

  /// Runner that records every command line and always succeeds
  #[derive(Default)]
  pub struct RecordingRunner {
    pub seen: RefCell<Vec<String>>,
  }

  impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &ShellCommand) -> TrainResult<CommandOutput> {
      self.seen.borrow_mut().push(cmd.display());
      Ok(CommandOutput {
        stdout: String::new(),
        stderr: String::new(),
      })
    }
  }

  pub struct NullHost;

  impl ReleaseHost for NullHost {
    fn issue_token(&self, _: &str, _: &str, _: &str) -> TrainResult<Credentials> {
      Ok(Credentials::from_token("test-token"))
    }

    fn revoke_token(&self, _: &Credentials) -> TrainResult<()> {
      Ok(())
    }

    fn create_release(&self, _: &Credentials, tag: &str, _: &str) -> TrainResult<CreatedRelease> {
      Ok(CreatedRelease {
        tag: tag.to_string(),
        url: None,
      })
    }

    fn commit_author(&self, _: &Credentials, _: &str) -> TrainResult<Option<String>> {
      Ok(None)
    }
  }

  pub struct NullPrompt;

  impl Prompt for NullPrompt {
    fn ask(&self, _question: &str) -> TrainResult<String> {
      Ok("000000".to_string())
    }
  }

  pub struct SilentReporter;
  impl Reporter for SilentReporter {}

  pub fn test_config() -> TrainConfig {
    toml_edit::de::from_str(
      r#"
[remote]
owner = "acme"
repo = "widgets"
"#,
    )
    .unwrap()
  }

  pub fn test_workspace() -> Workspace {
    let manifest = Manifest::parse(r#"{"name": "@scope/pkgA", "version": "1.0.0"}"#).unwrap();
    Workspace {
      root: PathBuf::from("/tmp/test-ws"),
      packages: vec![Package {
        name: "@scope/pkgA".to_string(),
        dir: PathBuf::from("packages/pkg-a"),
        manifest,
        version: Version::new(1, 0, 0),
        last_tag: None,
        new_version: None,
      }],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::testutil::*;
  use super::*;
  use std::cell::RefCell;
  use std::rc::Rc;

  fn tracking_task(title: &'static str, log: Rc<RefCell<Vec<&'static str>>>, fail: bool) -> Task {
    Task::new(title, move |_ctx, _ws, _env| {
      log.borrow_mut().push(title);
      if fail {
        Err(TrainError::message(format!("{} failed", title)))
      } else {
        Ok(())
      }
    })
  }

  fn run_pipeline(pipeline: &mut Pipeline) -> PipelineOutcome {
    let config = test_config();
    let runner = RecordingRunner::default();
    let git = Git::new(&runner, "/tmp/test-ws");
    let npm = Npm::new(&runner, &SilentReporter, 0);
    let creds = Credentials::from_token("t");
    let env = ReleaseEnv {
      config: &config,
      git: &git,
      npm: &npm,
      host: &NullHost,
      credentials: &creds,
      prompt: &NullPrompt,
      reporter: &SilentReporter,
      prerelease: false,
    };

    let mut ws = test_workspace();
    let mut ctx = ReleaseContext::new(0, "@scope/pkgA");
    pipeline.execute(&mut ctx, &mut ws, &env)
  }

  #[test]
  fn test_failure_stops_everything_including_cleanup() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let tasks = vec![
      tracking_task("one", log.clone(), false),
      tracking_task("two", log.clone(), false),
      tracking_task("three", log.clone(), true),
      tracking_task("four", log.clone(), false),
      tracking_task("five", log.clone(), false),
      Task::new("cleanup", {
        let log = log.clone();
        move |_, _, _| {
          log.borrow_mut().push("cleanup");
          Ok(())
        }
      })
      .always_run(),
    ];

    let outcome = run_pipeline(&mut Pipeline::new(tasks));
    assert!(matches!(outcome, PipelineOutcome::Failed(_)));
    assert_eq!(*log.borrow(), vec!["one", "two", "three"]);
  }

  #[test]
  fn test_skip_flag_skips_all_but_always_run() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let tasks = vec![
      Task::new("collect", {
        let log = log.clone();
        move |ctx: &mut ReleaseContext, _: &mut Workspace, _: &ReleaseEnv<'_>| {
          log.borrow_mut().push("collect");
          ctx.skip_remaining = true;
          Ok(())
        }
      }),
      tracking_task("bump", log.clone(), false),
      tracking_task("publish", log.clone(), false),
      Task::new("cleanup", {
        let log = log.clone();
        move |_, _, _| {
          log.borrow_mut().push("cleanup");
          Ok(())
        }
      })
      .always_run(),
    ];

    let outcome = run_pipeline(&mut Pipeline::new(tasks));
    assert!(matches!(outcome, PipelineOutcome::SkippedNoRelease));
    assert_eq!(*log.borrow(), vec!["collect", "cleanup"]);
  }

  #[test]
  fn test_enabled_predicate_skips_without_aborting() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let tasks = vec![
      tracking_task("one", log.clone(), false),
      tracking_task("gated", log.clone(), false).enabled_when(|_| false),
      tracking_task("three", log.clone(), false),
    ];

    let outcome = run_pipeline(&mut Pipeline::new(tasks));
    assert!(matches!(outcome, PipelineOutcome::Completed));
    assert_eq!(*log.borrow(), vec!["one", "three"]);
  }

  #[test]
  fn test_pipeline_refuses_a_second_execution() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut pipeline = Pipeline::new(vec![tracking_task("only", log.clone(), false)]);

    assert!(matches!(run_pipeline(&mut pipeline), PipelineOutcome::Completed));
    assert!(matches!(run_pipeline(&mut pipeline), PipelineOutcome::Failed(_)));
    // The tasks themselves ran only once
    assert_eq!(*log.borrow(), vec!["only"]);
  }
}
