use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    components::timer::{bounded_ms, MAX_TIMER_MS},
    errors::{ClientError, Result},
    utils::{self, ensure_dir, write_atomic},
};

const CONFIG_FILE: &str = "config.json";

/// Page-level settings shared by the wizard, the transport and the components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub draft_storage_key: String,
    pub login_redirect: String,
    pub csrf_token_meta: String,
    pub csrf_header_meta: String,
    pub default_csrf_header: String,
    pub base_url: String,
    pub polling_interval_ms: u64,
    pub autosave_debounce_ms: u64,
    pub notice_timeout_ms: u64,
    pub max_session_preferences: usize,
    pub total_steps: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            draft_storage_key: "registrationProgress".into(),
            login_redirect: "/login?expired=true".into(),
            csrf_token_meta: "_csrf".into(),
            csrf_header_meta: "_csrf_header".into(),
            default_csrf_header: "X-CSRF-TOKEN".into(),
            base_url: "http://localhost:8080".into(),
            polling_interval_ms: 30_000,
            autosave_debounce_ms: 3_000,
            notice_timeout_ms: 5_000,
            max_session_preferences: 3,
            total_steps: 5,
        }
    }
}

impl ClientConfig {
    /// Rejects settings the wizard cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.total_steps == 0 {
            return Err(ClientError::Config("total_steps must be at least 1".into()));
        }
        if self.max_session_preferences == 0 {
            return Err(ClientError::Config(
                "max_session_preferences must be at least 1".into(),
            ));
        }
        if self.draft_storage_key.trim().is_empty() {
            return Err(ClientError::Config("draft_storage_key cannot be empty".into()));
        }
        for (field, ms) in [
            ("polling_interval_ms", self.polling_interval_ms),
            ("autosave_debounce_ms", self.autosave_debounce_ms),
            ("notice_timeout_ms", self.notice_timeout_ms),
        ] {
            if bounded_ms(ms).is_none() {
                return Err(ClientError::Config(format!(
                    "{} must be between 1 and {}",
                    field, MAX_TIMER_MS
                )));
            }
        }
        Ok(())
    }
}

/// Loads and saves [`ClientConfig`] as JSON under the data directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(utils::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        let config_root = utils::config_dir_in(&base);
        ensure_dir(&config_root)?;
        Ok(Self {
            path: config_root.join(CONFIG_FILE),
        })
    }

    pub fn load(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            return Ok(ClientConfig::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: ClientConfig =
            serde_json::from_str(&data).map_err(|err| ClientError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &ClientConfig) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        tracing::debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(manager.load().unwrap(), ClientConfig::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = ClientConfig {
            polling_interval_ms: 5_000,
            base_url: "https://classes.example.org".into(),
            ..ClientConfig::default()
        };
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{"total_steps": 4}"#).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.total_steps, 4);
        assert_eq!(config.draft_storage_key, "registrationProgress");
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let config = ClientConfig {
            total_steps: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }

    #[test]
    fn timer_settings_must_fit_in_a_day() {
        let huge = ClientConfig {
            polling_interval_ms: 9_000_000_000_000_000,
            ..ClientConfig::default()
        };
        let err = huge.validate().unwrap_err();
        assert!(matches!(err, ClientError::Config(ref message) if message.contains("polling_interval_ms")));

        let zero = ClientConfig {
            notice_timeout_ms: 0,
            ..ClientConfig::default()
        };
        assert!(zero.validate().is_err());

        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{"autosave_debounce_ms": 18446744073709551615}"#).unwrap();
        assert!(matches!(manager.load(), Err(ClientError::Config(_))));
    }
}
