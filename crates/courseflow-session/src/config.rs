//! Configuration for the learner session engine.
//!
//! Loaded from `courseflow.json` when present; every field has a default so
//! a missing file is not an error. CLI flags override file values.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "courseflow.json";

/// Default backend API base URL.
fn default_api_base_url() -> String {
    "http://localhost:4000".to_string()
}

/// Default debounce window for watch-position updates, in milliseconds.
const fn default_debounce_millis() -> u64 {
    2000
}

/// Default window before an unconfirmed optimistic completion reverts,
/// in seconds.
const fn default_optimistic_window_secs() -> u64 {
    10
}

/// Default per-request timeout, in seconds.
const fn default_request_timeout_secs() -> u64 {
    30
}

/// Main configuration for a learning session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Base URL of the backend API (no trailing slash required).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Debounce window for watch-position updates, in milliseconds.
    #[serde(default = "default_debounce_millis")]
    pub debounce_millis: u64,

    /// How long an optimistic lesson completion may remain unconfirmed
    /// before it reverts, in seconds.
    #[serde(default = "default_optimistic_window_secs")]
    pub optimistic_window_secs: u64,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            debounce_millis: default_debounce_millis(),
            optimistic_window_secs: default_optimistic_window_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SessionConfig {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `courseflow.json`; if absent, returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON or
    /// invalid values.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            SessionError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_file(&current_dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ConfigParse` for unreadable or invalid JSON,
    /// and `SessionError::ConfigValidation` for invalid values.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(SessionError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| SessionError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ConfigValidation` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(SessionError::config_validation(
                "apiBaseUrl must not be empty",
                "Provide the backend base URL in your courseflow.json",
            ));
        }

        if self.debounce_millis == 0 {
            return Err(SessionError::config_validation(
                "debounceMillis must be greater than 0",
                "Set debounceMillis to at least 1 in your courseflow.json",
            ));
        }

        if self.optimistic_window_secs == 0 {
            return Err(SessionError::config_validation(
                "optimisticWindowSecs must be greater than 0",
                "Set optimisticWindowSecs to at least 1 in your courseflow.json",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(SessionError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Set requestTimeoutSecs to at least 1 in your courseflow.json",
            ));
        }

        Ok(())
    }
}
