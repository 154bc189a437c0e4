//! Runtime configuration.
//!
//! A `Settings` value is built once at startup - defaults, then an optional
//! TOML file, then `CARDFORGE_*` environment overrides - and handed
//! explicitly to gate and client constructors. The core keeps no ambient
//! global.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::security::EgressPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum accepted upload size, in megabytes.
    pub max_upload_mb: u64,

    /// Outbound HTTP timeout, in seconds.
    pub http_timeout_secs: u64,

    /// Whether the proxy may target localhost (self-hosted backends).
    pub proxy_allow_localhost: bool,

    /// Hostnames the proxy is permitted to contact. `*.domain` entries
    /// match subdomains.
    pub proxy_url_allowlist: Vec<String>,

    /// Scrub credential-shaped strings from log output.
    pub log_redact: bool,

    /// Base URL of the third-party character importer API.
    pub importer_base_url: String,

    /// Importer endpoint paths.
    pub importer_character_path: String,
    pub importer_lorebook_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_upload_mb: 20,
            http_timeout_secs: 30,
            proxy_allow_localhost: false,
            proxy_url_allowlist: vec![
                "api.openai.com".to_string(),
                "api.anthropic.com".to_string(),
                "openrouter.ai".to_string(),
                "generativelanguage.googleapis.com".to_string(),
            ],
            log_redact: true,
            importer_base_url: "https://api.quack.ai".to_string(),
            importer_character_path: "/character/info".to_string(),
            importer_lorebook_path: "/character/book".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(p) => toml::from_str(&std::fs::read_to_string(p)?)?,
            None => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("CARDFORGE_ALLOW_LOCALHOST") {
            self.proxy_allow_localhost = matches!(v.as_str(), "1" | "true" | "yes");
        }
        if let Ok(v) = std::env::var("CARDFORGE_ALLOWLIST") {
            self.proxy_url_allowlist = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("CARDFORGE_HTTP_TIMEOUT") {
            if let Ok(secs) = v.parse() {
                self.http_timeout_secs = secs;
            }
        }
    }

    /// Maximum upload size in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }

    /// The egress policy value handed to gate and client constructors.
    pub fn egress_policy(&self) -> EgressPolicy {
        EgressPolicy::new(self.proxy_url_allowlist.clone(), self.proxy_allow_localhost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_locked_down() {
        let settings = Settings::default();
        assert!(!settings.proxy_allow_localhost);
        assert!(settings.log_redact);
        assert!(
            settings
                .proxy_url_allowlist
                .iter()
                .any(|h| h == "api.openai.com")
        );
        assert_eq!(settings.max_upload_bytes(), 20 * 1024 * 1024);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            proxy_allow_localhost = true
            proxy_url_allowlist = ["my.backend.example"]
            "#,
        )
        .unwrap();
        assert!(settings.proxy_allow_localhost);
        assert_eq!(settings.proxy_url_allowlist, vec!["my.backend.example"]);
        // untouched fields keep their defaults
        assert_eq!(settings.http_timeout_secs, 30);
    }

    #[test]
    fn policy_reflects_settings() {
        let settings = Settings {
            proxy_allow_localhost: true,
            ..Settings::default()
        };
        assert!(settings.egress_policy().allow_localhost());
    }
}
