//! Error types for release-train with contextual messages and exit codes
//!
//! This module provides a unified error type that categorizes failures and
//! carries contextual help messages. Two variants are control signals rather
//! than true failures: `OtpRetry` (publish wants a fresh one-time password)
//! is recovered by the publish task, and skipped releases never become errors
//! at all (see `pipeline::PipelineOutcome`).

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for release-train
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (I/O, network transport)
  System = 2,
  /// Release failure (command failed mid-run, rollback performed)
  Release = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for release-train
#[derive(Debug)]
pub enum TrainError {
  /// Configuration errors
  Config(ConfigError),

  /// External process exited non-zero
  Command(CommandError),

  /// Release host returned a non-2xx response
  Network(NetworkError),

  /// Retry budget exhausted; wraps the last failure
  RetryExhausted { attempts: u32, source: Box<TrainError> },

  /// Publish rejected with a one-time-password marker.
  ///
  /// Recoverable: the publish task re-prompts and re-publishes.
  OtpRetry,

  /// I/O errors
  Io(io::Error),

  /// Another variant annotated with what the run was doing
  Contextual { context: String, source: Box<TrainError> },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl TrainError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    TrainError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    TrainError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error. The wrapped error keeps its exit
  /// code, help text and OTP classification.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      TrainError::Message { message, context, help } => TrainError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      other => TrainError::Contextual {
        context: ctx_str,
        source: Box::new(other),
      },
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      TrainError::Config(_) => ExitCode::User,
      TrainError::Command(_) => ExitCode::Release,
      TrainError::Network(_) => ExitCode::Release,
      TrainError::RetryExhausted { source, .. } => source.exit_code(),
      TrainError::OtpRetry => ExitCode::Release,
      TrainError::Io(_) => ExitCode::System,
      TrainError::Contextual { source, .. } => source.exit_code(),
      TrainError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      TrainError::Config(e) => e.help_message(),
      TrainError::Network(e) => e.help_message(),
      TrainError::RetryExhausted { source, .. } => source.help_message(),
      TrainError::OtpRetry => Some("Re-run and provide a fresh one-time password when prompted.".to_string()),
      TrainError::Contextual { source, .. } => source.help_message(),
      TrainError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }

  /// True when this error is the publish OTP marker (possibly behind retries)
  pub fn is_otp_retry(&self) -> bool {
    match self {
      TrainError::OtpRetry => true,
      TrainError::RetryExhausted { source, .. } => source.is_otp_retry(),
      TrainError::Command(e) => e.is_otp_failure(),
      TrainError::Contextual { source, .. } => source.is_otp_retry(),
      _ => false,
    }
  }
}

impl fmt::Display for TrainError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrainError::Config(e) => write!(f, "{}", e),
      TrainError::Command(e) => write!(f, "{}", e),
      TrainError::Network(e) => write!(f, "{}", e),
      TrainError::RetryExhausted { attempts, source } => {
        write!(f, "Failed after {} attempt(s): {}", attempts, source)
      }
      TrainError::OtpRetry => write!(f, "Publish requires a one-time password"),
      TrainError::Io(e) => write!(f, "I/O error: {}", e),
      TrainError::Contextual { context, source } => write!(f, "{}: {}", context, source),
      TrainError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for TrainError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      TrainError::Io(e) => Some(e),
      TrainError::RetryExhausted { source, .. } => Some(source.as_ref()),
      TrainError::Contextual { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for TrainError {
  fn from(err: io::Error) -> Self {
    TrainError::Io(err)
  }
}

impl From<String> for TrainError {
  fn from(msg: String) -> Self {
    TrainError::message(msg)
  }
}

impl From<&str> for TrainError {
  fn from(msg: &str) -> Self {
    TrainError::message(msg)
  }
}

impl From<serde_json::Error> for TrainError {
  fn from(err: serde_json::Error) -> Self {
    TrainError::message(format!("JSON error: {}", err))
  }
}

impl From<toml_edit::TomlError> for TrainError {
  fn from(err: toml_edit::TomlError) -> Self {
    TrainError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for TrainError {
  fn from(err: toml_edit::de::Error) -> Self {
    TrainError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<semver::Error> for TrainError {
  fn from(err: semver::Error) -> Self {
    TrainError::message(format!("Version parse error: {}", err))
  }
}

impl From<std::str::Utf8Error> for TrainError {
  fn from(err: std::str::Utf8Error) -> Self {
    TrainError::message(format!("UTF-8 error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for TrainError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    TrainError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<reqwest::Error> for TrainError {
  fn from(err: reqwest::Error) -> Self {
    TrainError::Network(NetworkError {
      status: err.status().map(|s| s.as_u16()).unwrap_or(0),
      message: err.to_string(),
    })
  }
}

/// Convert anyhow::Error to TrainError (test helpers use anyhow)
impl From<anyhow::Error> for TrainError {
  fn from(err: anyhow::Error) -> Self {
    TrainError::message(err.to_string())
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// train.toml not found
  NotFound { workspace_root: PathBuf },

  /// Package not found in the workspace
  PackageNotFound { name: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create a train.toml with [remote] owner/repo and a [workspace] packages dir.".to_string())
      }
      ConfigError::PackageNotFound { name } => Some(format!(
        "Run `release-train plan` to list discovered packages. Is '{}' under the configured packages dir?",
        name
      )),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { workspace_root } => {
        write!(
          f,
          "No release-train configuration found.\nExpected file: {}/train.toml",
          workspace_root.display()
        )
      }
      ConfigError::PackageNotFound { name } => {
        write!(f, "Package '{}' not found in workspace", name)
      }
    }
  }
}

/// External process failure
#[derive(Debug)]
pub struct CommandError {
  /// The full command line that failed
  pub command: String,
  /// Exit code, if the process exited at all
  pub exit_code: Option<i32>,
  /// Captured stderr
  pub stderr: String,
}

impl CommandError {
  /// npm prints these markers when publish needs a one-time password
  pub fn is_otp_failure(&self) -> bool {
    self.stderr.contains("EOTP") || self.stderr.to_lowercase().contains("one-time pass")
  }
}

impl fmt::Display for CommandError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.exit_code {
      Some(code) => write!(f, "Command failed ({}): {}\n{}", code, self.command, self.stderr),
      None => write!(f, "Command terminated: {}\n{}", self.command, self.stderr),
    }
  }
}

/// Non-2xx response from the release host
#[derive(Debug)]
pub struct NetworkError {
  /// HTTP status (0 when the transport itself failed)
  pub status: u16,
  /// Message surfaced from the response body, or the transport error
  pub message: String,
}

impl NetworkError {
  fn help_message(&self) -> Option<String> {
    match self.status {
      401 | 403 => Some("Check your credentials and one-time password.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for NetworkError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.status == 0 {
      write!(f, "Network request failed: {}", self.message)
    } else {
      write!(f, "Release host returned {}: {}", self.status, self.message)
    }
  }
}

/// Result type alias for release-train
pub type TrainResult<T> = Result<T, TrainError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> TrainResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> TrainResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<TrainError>,
{
  fn context(self, ctx: impl Into<String>) -> TrainResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> TrainResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &TrainError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
