//! Terminal output: reporter seam and interactive prompt seam
//!
//! Every observable event in a run flows through [`Reporter`]; retry logic in
//! `core::runner` notifies it on each failed attempt. The default
//! implementation prints; tests swap in recording implementations.

pub mod progress;

use crate::core::error::{TrainError, TrainResult};
use crate::pipeline::PipelineOutcome;
use std::cell::RefCell;
use std::io::Write;

/// Observability sink for run events
pub trait Reporter {
  /// A package pipeline is about to run `total` tasks
  fn pipeline_started(&self, package: &str, total: usize) {
    let _ = (package, total);
  }

  /// A package pipeline finished with the given outcome
  fn pipeline_finished(&self, package: &str, outcome: &PipelineOutcome) {
    let _ = (package, outcome);
  }

  fn task_started(&self, title: &str) {
    let _ = title;
  }

  fn task_skipped(&self, title: &str) {
    let _ = title;
  }

  fn task_completed(&self, title: &str) {
    let _ = title;
  }

  /// A command failed and will be retried
  fn retry_attempt(&self, command: &str, attempt: u32, remaining: u32, error: &TrainError) {
    let _ = (command, attempt, remaining, error);
  }

  fn note(&self, message: &str) {
    let _ = message;
  }

  fn warn(&self, message: &str) {
    let _ = message;
  }
}

/// Default reporter: prints to stdout/stderr with a per-pipeline progress bar
pub struct ConsoleReporter {
  bar: RefCell<Option<progress::TaskProgress>>,
}

impl ConsoleReporter {
  pub fn new() -> Self {
    Self { bar: RefCell::new(None) }
  }
}

impl Default for ConsoleReporter {
  fn default() -> Self {
    Self::new()
  }
}

impl Reporter for ConsoleReporter {
  fn pipeline_started(&self, package: &str, total: usize) {
    println!("📦 {}", package);
    *self.bar.borrow_mut() = Some(progress::TaskProgress::new(total, package.to_string()));
  }

  fn pipeline_finished(&self, package: &str, outcome: &PipelineOutcome) {
    self.bar.borrow_mut().take();
    match outcome {
      PipelineOutcome::Completed => println!("✅ {} released", package),
      PipelineOutcome::SkippedNoRelease => println!("⏭️  {} has no release-worthy changes", package),
      PipelineOutcome::Failed(err) => println!("❌ {} failed: {}", package, err),
    }
  }

  fn task_started(&self, title: &str) {
    println!("   • {}", title);
  }

  fn task_skipped(&self, title: &str) {
    println!("   ⏭  {} (skipped)", title);
    if let Some(bar) = self.bar.borrow_mut().as_mut() {
      bar.inc();
    }
  }

  fn task_completed(&self, _title: &str) {
    if let Some(bar) = self.bar.borrow_mut().as_mut() {
      bar.inc();
    }
  }

  fn retry_attempt(&self, command: &str, attempt: u32, remaining: u32, error: &TrainError) {
    eprintln!(
      "⚠️  Attempt {} failed ({} retries left): {}\n   {}",
      attempt, remaining, command, error
    );
  }

  fn note(&self, message: &str) {
    println!("   {}", message);
  }

  fn warn(&self, message: &str) {
    eprintln!("⚠️  {}", message);
  }
}

/// Interactive prompt seam
///
/// Prompt rendering stays out of the core: this trait is the whole surface.
pub trait Prompt {
  /// Ask a question, return the trimmed answer
  fn ask(&self, question: &str) -> TrainResult<String>;
}

/// Plain stdin prompt
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
  fn ask(&self, question: &str) -> TrainResult<String> {
    print!("{}: ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
  }
}
