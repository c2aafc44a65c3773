//! Configuration for release-train (train.toml at the workspace root)

use crate::core::error::{ConfigError, ResultExt, TrainError, TrainResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for release-train
///
/// Loaded from `train.toml` in the workspace root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
  #[serde(default)]
  pub workspace: WorkspaceConfig,
  pub remote: RemoteConfig,
  #[serde(default)]
  pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
  /// Directory containing the packages (one subdirectory per package)
  #[serde(default = "default_packages_dir")]
  pub packages_dir: PathBuf,

  /// npm script run before releasing each package (skipped when absent)
  #[serde(default)]
  pub build_script: Option<String>,
}

fn default_packages_dir() -> PathBuf {
  PathBuf::from("packages")
}

impl Default for WorkspaceConfig {
  fn default() -> Self {
    Self {
      packages_dir: default_packages_dir(),
      build_script: None,
    }
  }
}

/// Release host coordinates (GitHub)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
  pub owner: String,
  pub repo: String,

  /// API base URL (override for GitHub Enterprise)
  #[serde(default = "default_api_url")]
  pub api_url: String,
}

fn default_api_url() -> String {
  "https://api.github.com".to_string()
}

impl RemoteConfig {
  /// Browsable repository URL used in changelog links
  pub fn repo_url(&self) -> String {
    format!("https://github.com/{}/{}", self.owner, self.repo)
  }
}

/// Package registry (npm) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
  /// Access level passed to publish (e.g. "public" for scoped packages)
  #[serde(default)]
  pub access: Option<String>,

  /// Extra attempts for long-running install/build/publish commands
  #[serde(default = "default_command_retries")]
  pub command_retries: u32,
}

fn default_command_retries() -> u32 {
  2
}

impl Default for RegistryConfig {
  fn default() -> Self {
    Self {
      access: None,
      command_retries: default_command_retries(),
    }
  }
}

impl TrainConfig {
  /// Load train.toml from the workspace root
  pub fn load(workspace_root: &Path) -> TrainResult<Self> {
    let path = workspace_root.join("train.toml");
    if !path.exists() {
      return Err(TrainError::Config(ConfigError::NotFound {
        workspace_root: workspace_root.to_path_buf(),
      }));
    }

    let content = fs::read_to_string(&path)?;
    let config: TrainConfig =
      toml_edit::de::from_str(&content).with_context(|| format!("While parsing {}", path.display()))?;
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_minimal_config() {
    let config: TrainConfig = toml_edit::de::from_str(
      r#"
[remote]
owner = "acme"
repo = "widgets"
"#,
    )
    .unwrap();

    assert_eq!(config.workspace.packages_dir, PathBuf::from("packages"));
    assert_eq!(config.remote.repo_url(), "https://github.com/acme/widgets");
    assert_eq!(config.remote.api_url, "https://api.github.com");
    assert_eq!(config.registry.command_retries, 2);
    assert!(config.registry.access.is_none());
  }

  #[test]
  fn test_parse_full_config() {
    let config: TrainConfig = toml_edit::de::from_str(
      r#"
[workspace]
packages_dir = "libs"
build_script = "build"

[remote]
owner = "acme"
repo = "widgets"
api_url = "https://github.example.com/api/v3"

[registry]
access = "public"
command_retries = 0
"#,
    )
    .unwrap();

    assert_eq!(config.workspace.packages_dir, PathBuf::from("libs"));
    assert_eq!(config.workspace.build_script.as_deref(), Some("build"));
    assert_eq!(config.registry.access.as_deref(), Some("public"));
    assert_eq!(config.registry.command_retries, 0);
  }

  #[test]
  fn test_missing_config_has_help() {
    let err = TrainConfig::load(Path::new("/nonexistent")).unwrap_err();
    assert!(err.help_message().is_some());
  }
}
