//! GitHub API implementation of the release host
//!
//! Blocking reqwest client with a fixed timeout. Non-2xx responses surface
//! the body's `message` field as a `NetworkError`.

use super::{CreatedRelease, Credentials, ReleaseHost};
use crate::core::error::{NetworkError, TrainError, TrainResult};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const USER_AGENT: &str = concat!("release-train/", env!("CARGO_PKG_VERSION"));

pub struct GithubHost {
  client: reqwest::blocking::Client,
  api_url: String,
  owner: String,
  repo: String,
}

#[derive(Deserialize)]
struct ErrorBody {
  message: String,
}

#[derive(Deserialize)]
struct AuthorizationBody {
  id: u64,
  token: String,
}

#[derive(Deserialize)]
struct ReleaseBody {
  html_url: Option<String>,
}

#[derive(Deserialize)]
struct CommitResponse {
  author: Option<UserRef>,
  commit: Option<CommitDetails>,
}

#[derive(Deserialize)]
struct UserRef {
  login: String,
}

#[derive(Deserialize)]
struct CommitDetails {
  author: Option<CommitAuthor>,
}

#[derive(Deserialize)]
struct CommitAuthor {
  name: Option<String>,
}

impl GithubHost {
  pub fn new(api_url: impl Into<String>, owner: impl Into<String>, repo: impl Into<String>) -> TrainResult<Self> {
    let client = reqwest::blocking::Client::builder()
      .user_agent(USER_AGENT)
      .timeout(Duration::from_secs(30))
      .build()?;

    Ok(Self {
      client,
      api_url: api_url.into().trim_end_matches('/').to_string(),
      owner: owner.into(),
      repo: repo.into(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.api_url, path)
  }

  fn repo_url(&self, path: &str) -> String {
    format!("{}/repos/{}/{}{}", self.api_url, self.owner, self.repo, path)
  }

  /// Surface a non-2xx status as a NetworkError with the body's message
  fn check(response: reqwest::blocking::Response) -> TrainResult<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }
    let message = response
      .json::<ErrorBody>()
      .map(|b| b.message)
      .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(TrainError::Network(NetworkError {
      status: status.as_u16(),
      message,
    }))
  }
}

impl ReleaseHost for GithubHost {
  fn issue_token(&self, username: &str, password: &str, otp: &str) -> TrainResult<Credentials> {
    let body = json!({
      "scopes": ["repo"],
      "note": format!("release-train {}", chrono::Utc::now().to_rfc3339()),
    });

    let response = self
      .client
      .post(self.url("/authorizations"))
      .basic_auth(username, Some(password))
      .header("X-GitHub-OTP", otp)
      .json(&body)
      .send()?;

    let auth: AuthorizationBody = Self::check(response)?.json()?;
    Ok(Credentials {
      token: auth.token,
      token_id: Some(auth.id),
    })
  }

  fn revoke_token(&self, credentials: &Credentials) -> TrainResult<()> {
    // Tokens taken from the environment have no id and are not ours to revoke
    let Some(id) = credentials.token_id else {
      return Ok(());
    };

    let response = self
      .client
      .delete(self.url(&format!("/authorizations/{}", id)))
      .bearer_auth(&credentials.token)
      .send()?;
    Self::check(response)?;
    Ok(())
  }

  fn create_release(&self, credentials: &Credentials, tag: &str, body: &str) -> TrainResult<CreatedRelease> {
    let payload = json!({
      "tag_name": tag,
      "name": tag,
      "body": body,
    });

    let response = self
      .client
      .post(self.repo_url("/releases"))
      .bearer_auth(&credentials.token)
      .json(&payload)
      .send()?;

    let release: ReleaseBody = Self::check(response)?.json()?;
    Ok(CreatedRelease {
      tag: tag.to_string(),
      url: release.html_url,
    })
  }

  fn commit_author(&self, credentials: &Credentials, sha: &str) -> TrainResult<Option<String>> {
    let response = self
      .client
      .get(self.repo_url(&format!("/commits/{}", sha)))
      .bearer_auth(&credentials.token)
      .send()?;

    let commit: CommitResponse = Self::check(response)?.json()?;
    let name = commit
      .commit
      .and_then(|c| c.author)
      .and_then(|a| a.name)
      .filter(|n| !n.is_empty())
      .or_else(|| commit.author.map(|u| u.login));
    Ok(name)
  }
}
