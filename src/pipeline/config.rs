//! Application configuration.
//!
//! Loads settings from config.json at startup: extraction service endpoint,
//! retry policy and image limits.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the generative language API
    pub api_base_url: String,
    /// Model used for scoreboard extraction
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,
    /// Total attempts per image, first try included
    pub max_attempts: u32,
    /// Delay before the first retry (milliseconds); doubles on each further retry
    pub backoff_base_ms: u64,
    /// Longest image side sent to the model (pixels)
    pub max_image_dimension: u32,
    /// Directory name used for persisted league state
    pub storage_namespace: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            request_timeout_secs: 120,
            max_attempts: 3,
            backoff_base_ms: 2000,
            max_image_dimension: 1600,
            storage_namespace: "raceboard".to_string(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Parses a config file, falling back to defaults on any problem.
    pub fn load_from(config_path: &Path) -> Self {
        crate::log(&format!("Looking for config at: {}", config_path.display()));

        if !config_path.exists() {
            crate::log("config.json not found. Using default config.");
            return Self::default();
        }

        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    config
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                    Self::default()
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
                Self::default()
            }
        }
    }
}

/// Initializes the global configuration from `<exe_dir>/config.json`.
/// Call once at startup.
pub fn init_config() {
    let config_path = crate::paths::get_exe_dir().join("config.json");
    let _ = CONFIG.set(AppConfig::load_from(&config_path));
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static AppConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json"));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"model": "custom-model", "backoff_base_ms": 10}"#).unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.model, "custom-model");
        assert_eq!(config.backoff_base(), Duration::from_millis(10));
        assert_eq!(config.max_image_dimension, 1600);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.storage_namespace, "raceboard");
    }

    #[test]
    fn test_api_key_from_env() {
        let config = AppConfig {
            api_key_env: "RACEBOARD_TEST_KEY_UNSET_VARIABLE".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.api_key(), None);
    }
}
