use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use utils::assets::{asset_dir, credentials_path, token_path};

pub const CURRENT_CONFIG_VERSION: &str = "v1";

fn default_config_version() -> String {
    CURRENT_CONFIG_VERSION.to_string()
}

fn default_vault_root() -> PathBuf {
    asset_dir().join("vault")
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub config_version: String,
    /// Root directory the local folder skeletons are created under.
    pub vault_root: PathBuf,
    pub anthropic: AnthropicConfig,
    pub google_drive: GoogleDriveConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            vault_root: default_vault_root(),
            anthropic: AnthropicConfig::default(),
            google_drive: GoogleDriveConfig::default(),
        }
    }
}

impl Config {
    pub fn from_raw(raw: &str) -> Config {
        match serde_json::from_str::<Config>(raw) {
            Ok(config) if config.config_version == CURRENT_CONFIG_VERSION => config,
            Ok(config) => {
                tracing::warn!(
                    "Unsupported config version '{}', falling back to defaults",
                    config.config_version
                );
                Config::default()
            }
            Err(err) => {
                tracing::warn!("Failed to parse config file: {}, using defaults", err);
                Config::default()
            }
        }
    }

    /// Startup validation. A missing generation-service key is fatal; a
    /// missing Drive credentials file only disables remote sync.
    pub fn validate(&self) -> Result<(), super::ConfigError> {
        if self.anthropic.resolved_api_key().is_none() {
            return Err(super::ConfigError::ValidationError(
                "No Anthropic API key configured; set anthropic.api_key or ANTHROPIC_API_KEY"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
        }
    }
}

impl AnthropicConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                std::env::var("ANTHROPIC_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleDriveConfig {
    /// OAuth client secrets downloaded from the Google Cloud console.
    pub credentials_path: PathBuf,
    /// Cached access/refresh token written after the consent flow.
    pub token_path: PathBuf,
    /// Shared Drive to operate in instead of the user's own drive.
    pub shared_drive_id: Option<String>,
}

impl Default for GoogleDriveConfig {
    fn default() -> Self {
        Self {
            credentials_path: credentials_path(),
            token_path: token_path(),
            shared_drive_id: None,
        }
    }
}

impl GoogleDriveConfig {
    /// Remote sync is possible when either the client secrets or a cached
    /// token are present.
    pub fn is_configured(&self) -> bool {
        self.credentials_path.exists() || self.token_path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, CURRENT_CONFIG_VERSION};

    #[test]
    fn from_raw_falls_back_on_garbage() {
        let config = Config::from_raw("not json at all");
        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
    }

    #[test]
    fn from_raw_falls_back_on_unknown_version() {
        let config = Config::from_raw(r#"{"config_version": "v99"}"#);
        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
    }

    #[test]
    fn from_raw_keeps_recognized_fields() {
        let raw = r#"{
            "config_version": "v1",
            "vault_root": "/tmp/vault",
            "anthropic": {"api_key": "sk-test", "model": "claude-3-5-sonnet-20241022"}
        }"#;
        let config = Config::from_raw(raw);
        assert_eq!(config.vault_root, std::path::PathBuf::from("/tmp/vault"));
        assert_eq!(config.anthropic.api_key.as_deref(), Some("sk-test"));
    }
}
