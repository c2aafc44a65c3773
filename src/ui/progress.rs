//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free progress bars. One bar per package
//! pipeline, advanced as tasks complete.

use linya::{Bar, Progress};

/// Progress bar wrapper for a package pipeline's tasks
pub struct TaskProgress {
  progress: Progress,
  bar: Bar,
}

impl TaskProgress {
  /// Create a new progress bar for a pipeline with `total` tasks
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Advance by one completed task
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
