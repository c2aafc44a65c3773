//! Remote release host collaborator (GitHub)

mod github;

pub use github::GithubHost;

use crate::core::error::TrainResult;

/// Bearer credentials issued for one run.
///
/// Owned by the driver, written once during setup, read by every
/// HTTP-calling task, and revoked/cleared on every exit path.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub token: String,
  /// Host-side id of the issued token, for revocation; absent when the token
  /// came from the environment
  pub token_id: Option<u64>,
}

impl Credentials {
  pub fn from_token(token: impl Into<String>) -> Self {
    Self {
      token: token.into(),
      token_id: None,
    }
  }
}

/// A release created on the host
#[derive(Debug, Clone)]
pub struct CreatedRelease {
  pub tag: String,
  pub url: Option<String>,
}

/// What the release host exposes to the pipeline
pub trait ReleaseHost {
  /// Exchange basic auth + one-time password for a bearer token
  fn issue_token(&self, username: &str, password: &str, otp: &str) -> TrainResult<Credentials>;

  /// Revoke a previously issued token
  fn revoke_token(&self, credentials: &Credentials) -> TrainResult<()>;

  /// Create a release for an existing tag with the given notes body
  fn create_release(&self, credentials: &Credentials, tag: &str, body: &str) -> TrainResult<CreatedRelease>;

  /// Display name of a commit's author, if resolvable
  fn commit_author(&self, credentials: &Credentials, sha: &str) -> TrainResult<Option<String>>;
}
