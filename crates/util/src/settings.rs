//! Settings for the replykit client.
//!
//! Settings live in a small JSON file in the standard configuration directory
//! (`~/.config/replykit/settings.json` on most platforms). Every key is
//! optional; missing keys fall back to the defaults below. Environment
//! variables override the file, and command line flags override both.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::expand_tilde;

/// Environment variable allowing callers to override the settings file path.
pub const SETTINGS_PATH_ENV: &str = "REPLYKIT_SETTINGS_PATH";
/// Environment variable overriding the server base URL.
pub const BASE_URL_ENV: &str = "REPLYKIT_BASE_URL";

/// Default filename for the JSON payload.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/";
const DEFAULT_LOG_PATH: &str = "/log";
const DEFAULT_SUBMIT_PATH: &str = "/submit";

/// Error surfaced when reading settings fails.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid base URL '{value}': {source}")]
    BaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Persisted settings values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Origin of the form server (log collection and submission live below it).
    pub base_url: String,
    /// Path of the log collection endpoint.
    pub log_path: String,
    /// Path the form posts to.
    pub submit_path: String,
    /// Whether log events are forwarded to the log collection endpoint.
    pub remote_logging: bool,
    /// Where the cookie jar is stored. Defaults next to the settings file.
    pub cookie_jar_path: Option<PathBuf>,
    /// Where console log lines go while the terminal UI owns the screen.
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            log_path: DEFAULT_LOG_PATH.to_string(),
            submit_path: DEFAULT_SUBMIT_PATH.to_string(),
            remote_logging: true,
            cookie_jar_path: None,
            log_file: None,
        }
    }
}

impl Settings {
    /// Loads settings from `path` (or the default location) and applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let resolved_path = path.map(Path::to_path_buf).unwrap_or_else(default_settings_path);
        let mut settings = load_payload(&resolved_path)?;
        if let Ok(base_url) = env::var(BASE_URL_ENV) {
            let trimmed = base_url.trim();
            if !trimmed.is_empty() {
                settings.base_url = trimmed.to_string();
            }
        }
        Ok(settings)
    }

    /// Parsed server origin.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        Url::parse(&self.base_url).map_err(|source| SettingsError::BaseUrl {
            value: self.base_url.clone(),
            source,
        })
    }

    pub fn log_endpoint(&self) -> Result<Url, SettingsError> {
        self.join(&self.log_path)
    }

    pub fn submit_endpoint(&self) -> Result<Url, SettingsError> {
        self.join(&self.submit_path)
    }

    pub fn cookie_jar_path(&self) -> PathBuf {
        self.cookie_jar_path
            .clone()
            .unwrap_or_else(|| config_root().join("cookies.json"))
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| config_root().join("logs").join("replykit.log"))
    }

    fn join(&self, path: &str) -> Result<Url, SettingsError> {
        self.base_url()?.join(path).map_err(|source| SettingsError::BaseUrl {
            value: format!("{}{}", self.base_url, path),
            source,
        })
    }
}

fn config_root() -> PathBuf {
    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("replykit")
}

fn default_settings_path() -> PathBuf {
    if let Ok(path) = env::var(SETTINGS_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }
    config_root().join(SETTINGS_FILE_NAME)
}

fn load_payload(path: &Path) -> Result<Settings, SettingsError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(settings) => Ok(settings),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse settings file; using defaults"
                );
                Ok(Settings::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(error) => Err(SettingsError::Io(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let settings = temp_env::with_var_unset(BASE_URL_ENV, || Settings::load(Some(&dir.path().join("nope.json"))))
            .expect("load settings");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, r#"{"base_url":"http://localhost:8080/","remote_logging":false}"#).expect("write");

        let settings = temp_env::with_var_unset(BASE_URL_ENV, || Settings::load(Some(&path))).expect("load settings");
        assert_eq!(settings.base_url, "http://localhost:8080/");
        assert!(!settings.remote_logging);
        assert_eq!(settings.submit_path, DEFAULT_SUBMIT_PATH);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, "{not json").expect("write");

        let settings = temp_env::with_var_unset(BASE_URL_ENV, || Settings::load(Some(&path))).expect("load settings");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn environment_overrides_base_url() {
        let dir = tempdir().expect("tempdir");
        let settings = temp_env::with_var(BASE_URL_ENV, Some("http://example.test/app/"), || {
            Settings::load(Some(&dir.path().join("nope.json")))
        })
        .expect("load settings");
        assert_eq!(settings.base_url, "http://example.test/app/");
    }

    #[test]
    fn endpoints_resolve_against_base_url() {
        let settings = Settings {
            base_url: "http://127.0.0.1:5000/".into(),
            ..Settings::default()
        };
        assert_eq!(settings.log_endpoint().expect("log").as_str(), "http://127.0.0.1:5000/log");
        assert_eq!(settings.submit_endpoint().expect("submit").as_str(), "http://127.0.0.1:5000/submit");
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let settings = Settings {
            base_url: "not a url".into(),
            ..Settings::default()
        };
        assert!(matches!(settings.base_url(), Err(SettingsError::BaseUrl { .. })));
    }
}
