//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A test monorepo with git history and a train.toml
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    std::fs::write(
      path.join("train.toml"),
      r#"[remote]
owner = "acme"
repo = "widgets"
"#,
    )?;
    std::fs::create_dir(path.join("packages"))?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Chore: initial workspace setup"])?;

    Ok(Self { _root: root, path })
  }

  /// Add a package under packages/. `deps` land in "dependencies" as
  /// caret ranges.
  pub fn add_package(&self, dir: &str, name: &str, version: &str, deps: &[(&str, &str)]) -> Result<PathBuf> {
    let package_path = self.path.join("packages").join(dir);
    std::fs::create_dir_all(&package_path)?;

    let mut manifest = format!("{{\n  \"name\": \"{}\",\n  \"version\": \"{}\"", name, version);
    if !deps.is_empty() {
      let entries: Vec<String> = deps
        .iter()
        .map(|(dep, range)| format!("    \"{}\": \"{}\"", dep, range))
        .collect();
      manifest.push_str(&format!(",\n  \"dependencies\": {{\n{}\n  }}", entries.join(",\n")));
    }
    manifest.push_str("\n}\n");

    std::fs::write(package_path.join("package.json"), manifest)?;
    Ok(package_path)
  }

  /// Commit current changes, returning the commit SHA
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Write a throwaway file inside a package and commit it with `message`,
  /// so the commit shows up in that package's history
  pub fn commit_change(&self, dir: &str, message: &str) -> Result<String> {
    let marker = self
      .path
      .join("packages")
      .join(dir)
      .join(format!("change-{}.txt", short_hash(message)));
    std::fs::write(marker, message)?;
    self.commit(message)
  }

  pub fn tag(&self, tag: &str) -> Result<()> {
    git(&self.path, &["tag", "-a", tag, "-m", tag])?;
    Ok(())
  }

  pub fn tags(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["tag", "--list"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }
}

fn short_hash(input: &str) -> String {
  let mut acc: u64 = 5381;
  for b in input.bytes() {
    acc = acc.wrapping_mul(33).wrapping_add(b as u64);
  }
  format!("{:x}", acc)
}

/// Run git in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the release-train binary, failing the test on a non-zero exit
pub fn run_release_train(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_release_train_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "release-train command failed: release-train {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run the binary and hand back the raw output, whatever the exit status
pub fn run_release_train_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_release-train");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run release-train")
}

pub fn stdout_of(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}
