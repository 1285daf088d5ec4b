//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by Cloud Run secret
//! bindings, so there is no separate Secret Manager client here.

use std::env;

/// Header set by Cloud Scheduler on HTTP-target jobs.
///
/// Cloud Run strips this header from external requests, so its presence
/// guarantees the request came from the scheduler.
pub const SCHEDULER_HEADER: &str = "x-cloudscheduler";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID (Firestore + FCM)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Path to the phrase catalog JSON file
    pub phrases_path: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Compatibility flag: increment the streak during the daily rollover
    /// when the last sign-in was yesterday, instead of waiting for the
    /// explicit "done" toggle. Off by default.
    pub streak_increment_on_rollover: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            phrases_path: env::var("PHRASES_PATH")
                .unwrap_or_else(|_| "data/phrases.json".to_string()),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            streak_increment_on_rollover: env::var("STREAK_INCREMENT_ON_ROLLOVER")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            phrases_path: "data/phrases.json".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            streak_increment_on_rollover: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("STREAK_INCREMENT_ON_ROLLOVER", "true");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert!(config.streak_increment_on_rollover);
        assert_eq!(config.phrases_path, "data/phrases.json");
    }

    #[test]
    fn test_default_is_toggle_driven() {
        let config = Config::test_default();
        assert!(!config.streak_increment_on_rollover);
    }
}
