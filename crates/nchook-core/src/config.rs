//! HookConfig - 設定ファイル（JSON）
//!
//! すべての項目に既定値があるので、ファイルが無くても起動できます。
//! CLI フラグはこの値を上書きします。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::HookError;
use crate::impls::{DEFAULT_APPS, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookConfig {
    /// Notification database; discovered when unset.
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Cursor file.
    /// Default: state.json
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,

    /// Ceiling on a single wait (milliseconds).
    /// Default: 5000
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Bundle identifiers to relay. Empty means every app.
    #[serde(default = "default_apps")]
    pub apps: Vec<String>,

    /// Default: 10000
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Default: 3
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Default: 500
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Default: 2.0
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,
}

fn default_state_file() -> PathBuf {
    PathBuf::from("state.json")
}

fn default_webhook_url() -> String {
    "http://localhost:8000/webhook".to_string()
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_apps() -> Vec<String> {
    DEFAULT_APPS.iter().map(|s| s.to_string()).collect()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_retry_multiplier() -> f64 {
    2.0
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            state_file: default_state_file(),
            webhook_url: default_webhook_url(),
            poll_interval_ms: default_poll_interval_ms(),
            apps: default_apps(),
            request_timeout_ms: default_request_timeout_ms(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_multiplier: default_retry_multiplier(),
        }
    }
}

impl HookConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HookError> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(HookError::Config(format!("cannot read {}: {e}", path.display())));
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| HookError::Config(format!("invalid {}: {e}", path.display())))
    }

    pub fn validate(&self) -> Result<(), HookError> {
        if self.poll_interval_ms == 0 {
            return Err(HookError::Config("poll_interval_ms must be greater than zero".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(HookError::Config("request_timeout_ms must be greater than zero".into()));
        }
        if self.webhook_url.trim().is_empty() {
            return Err(HookError::Config("webhook_url must not be empty".into()));
        }
        if self.retry_max_attempts == 0 {
            return Err(HookError::Config("retry_max_attempts must be at least 1".into()));
        }
        if !self.retry_multiplier.is_finite() || self.retry_multiplier < 1.0 {
            return Err(HookError::Config(format!(
                "retry_multiplier must be a finite number >= 1.0, got {}",
                self.retry_multiplier
            )));
        }
        Ok(())
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = path.into();
        self
    }

    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = url.into();
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            self.retry_multiplier,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::retry::MAX_BACKOFF;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = HookConfig::load(dir.path().join("config.json")).unwrap();
        assert_eq!(config, HookConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"webhook_url": "https://hooks.example/teams", "poll_interval_ms": 250, "apps": []}"#,
        )
        .unwrap();

        let config = HookConfig::load(&path).unwrap();
        assert_eq!(config.webhook_url, "https://hooks.example/teams");
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert!(config.apps.is_empty());
        assert_eq!(config.state_file, PathBuf::from("state.json"));
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn unknown_keys_and_bad_json_are_config_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        fs::write(&path, r#"{"pol_interval_ms": 1}"#).unwrap();
        assert!(matches!(HookConfig::load(&path), Err(HookError::Config(_))));

        fs::write(&path, "{").unwrap();
        assert!(matches!(HookConfig::load(&path), Err(HookError::Config(_))));
    }

    #[test]
    fn validate_rejects_nonsense() {
        let mut config = HookConfig::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let config = HookConfig::default().with_webhook_url("  ");
        assert!(config.validate().is_err());

        let mut config = HookConfig::default();
        config.retry_max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = HookConfig::default();
        config.request_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(HookError::Config(_))));
    }

    #[rstest]
    #[case(-1.0)]
    #[case(0.5)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn validate_rejects_unusable_retry_multiplier(#[case] multiplier: f64) {
        let mut config = HookConfig::default();
        config.retry_multiplier = multiplier;
        assert!(matches!(config.validate(), Err(HookError::Config(_))));
    }

    #[test]
    fn huge_retry_multiplier_still_gives_a_bounded_delay() {
        let mut config = HookConfig::default();
        config.retry_multiplier = 1e20;
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_policy().next_delay(2), MAX_BACKOFF);

        config.retry_multiplier = 1.0;
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_policy().next_delay(3), Duration::from_millis(500));
    }
}
