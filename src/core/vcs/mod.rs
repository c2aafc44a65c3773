//! Version-control collaborator on top of the command runner
//!
//! All git interaction is plain porcelain/plumbing invocations through
//! [`CommandRunner`]; parsing uses ASCII unit/record separators so titles and
//! bodies survive untouched.

use crate::core::error::TrainResult;
use crate::core::runner::{CommandRunner, ShellCommand};
use std::path::{Path, PathBuf};

/// Raw commit as returned by `git log` (oldest first)
#[derive(Debug, Clone)]
pub struct CommitRecord {
  pub sha: String,
  pub title: String,
  pub body: String,
}

/// Git repository rooted at the workspace
pub struct Git<'r> {
  runner: &'r dyn CommandRunner,
  root: PathBuf,
}

// %x1f / %x1e: field and record separators for parseable log output
const LOG_FORMAT: &str = "--format=%H%x1f%s%x1f%b%x1e";

impl<'r> Git<'r> {
  pub fn new(runner: &'r dyn CommandRunner, root: impl Into<PathBuf>) -> Self {
    Self { runner, root: root.into() }
  }

  fn git(&self) -> ShellCommand {
    ShellCommand::new("git")
      .current_dir(&self.root)
      .args(["-c", "advice.detachedHead=false"])
  }

  /// Commits since `since` (exclusive) touching `path`, oldest first.
  ///
  /// With `since` absent the whole history for the path is returned, which is
  /// the first-release case.
  pub fn commits_since(&self, since: Option<&str>, path: &Path) -> TrainResult<Vec<CommitRecord>> {
    let mut cmd = self.git().args(["log", "--reverse", "--no-merges", LOG_FORMAT]);
    if let Some(since_ref) = since {
      cmd = cmd.arg(format!("{}..HEAD", since_ref));
    }
    cmd = cmd.arg("--").arg(path.to_string_lossy());

    let output = self.runner.run(&cmd)?;
    Ok(parse_log_records(&output.stdout))
  }

  /// Annotated tags matching `<prefix>@*`, unsorted
  pub fn list_tags(&self, prefix: &str) -> TrainResult<Vec<String>> {
    let pattern = format!("{}@*", prefix);
    let output = self.runner.run(&self.git().args(["tag", "--list", &pattern]))?;
    Ok(output.stdout.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
  }

  pub fn create_tag(&self, tag: &str, message: &str) -> TrainResult<()> {
    self.runner.run(&self.git().args(["tag", "-a", tag, "-m", message]))?;
    Ok(())
  }

  pub fn delete_tag(&self, tag: &str) -> TrainResult<()> {
    self.runner.run(&self.git().args(["tag", "-d", tag]))?;
    Ok(())
  }

  /// Stage the given paths and commit them with `message`
  pub fn commit_paths(&self, message: &str, paths: &[PathBuf]) -> TrainResult<()> {
    let mut add = self.git().args(["add", "--"]);
    for path in paths {
      add = add.arg(path.to_string_lossy());
    }
    self.runner.run(&add)?;

    let mut commit = self.git().args(["commit", "-m", message, "--"]);
    for path in paths {
      commit = commit.arg(path.to_string_lossy());
    }
    self.runner.run(&commit)?;
    Ok(())
  }

  /// Push the current branch; optionally push tags as well
  pub fn push(&self, include_tags: bool) -> TrainResult<()> {
    self.runner.run(&self.git().arg("push"))?;
    if include_tags {
      self.runner.run(&self.git().args(["push", "--tags"]))?;
    }
    Ok(())
  }

  pub fn has_uncommitted_changes(&self) -> TrainResult<bool> {
    let output = self.runner.run(&self.git().args(["status", "--porcelain"]))?;
    Ok(!output.stdout.trim().is_empty())
  }

  /// Discard uncommitted working-tree changes and staged index state
  pub fn reset_hard(&self) -> TrainResult<()> {
    self.runner.run(&self.git().args(["reset", "--hard", "HEAD"]))?;
    Ok(())
  }
}

fn parse_log_records(stdout: &str) -> Vec<CommitRecord> {
  stdout
    .split('\x1e')
    .filter_map(|record| {
      let record = record.trim_matches(['\n', '\r']);
      if record.is_empty() {
        return None;
      }
      let mut fields = record.splitn(3, '\x1f');
      let sha = fields.next()?.trim().to_string();
      let title = fields.next()?.trim().to_string();
      let body = fields.next().unwrap_or("").trim().to_string();
      if sha.is_empty() {
        return None;
      }
      Some(CommitRecord { sha, title, body })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_log_records() {
    let raw = "abc123\x1fFix: resolve crash\x1fFix #42\x1e\ndef456\x1fNew: add widget\x1f\x1e\n";
    let records = parse_log_records(raw);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sha, "abc123");
    assert_eq!(records[0].title, "Fix: resolve crash");
    assert_eq!(records[0].body, "Fix #42");
    assert_eq!(records[1].title, "New: add widget");
    assert_eq!(records[1].body, "");
  }

  #[test]
  fn test_parse_log_records_empty() {
    assert!(parse_log_records("").is_empty());
    assert!(parse_log_records("\n").is_empty());
  }

  #[test]
  fn test_parse_log_records_multiline_body() {
    let raw = "abc\x1fBreaking: drop API\x1fline one\nClose #7\nline three\x1e";
    let records = parse_log_records(raw);
    assert_eq!(records[0].body, "line one\nClose #7\nline three");
  }
}
