//! Configuration management for audiencer.
//!
//! Runtime values live in [`Settings`]; an optional TOML file ([`Config`])
//! overlays the defaults, and CLI flags override both.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::backend::UploadContract;

/// Default backend base URL.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the segmentation backend, no trailing slash.
    pub endpoint: String,
    /// Active upload contract (uid_file or cpid_file deployment).
    pub contract: UploadContract,
    /// Directory where downloaded archives are saved.
    pub download_dir: PathBuf,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/Downloads/audiencer/ for saved archives
        let download_dir = dirs::download_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("audiencer");

        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            contract: UploadContract::default(),
            download_dir,
            user_agent: format!("audiencer/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Settings {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Validate and set the backend endpoint. Trailing slashes are dropped
    /// so paths can be appended directly.
    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<(), ConfigError> {
        let trimmed = endpoint.trim().trim_end_matches('/');
        let url = Url::parse(trimmed)
            .map_err(|e| ConfigError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint(format!(
                "{}: expected an http or https URL",
                endpoint
            )));
        }
        self.endpoint = trimmed.to_string();
        Ok(())
    }

    /// Ensure the download directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.download_dir)
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Upload contract: "uid_file" or "cpid_file".
    #[serde(default)]
    pub contract: Option<String>,
    /// Download directory; tilde paths are expanded.
    #[serde(default)]
    pub download_dir: Option<String>,
    /// User agent string.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file at the default location means defaults; a missing
    /// file the user named explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path(), false),
        };
        if !path.exists() {
            if explicit {
                return Err(ConfigError::NotFound(path));
            }
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) -> Result<(), ConfigError> {
        if let Some(ref endpoint) = self.endpoint {
            settings.set_endpoint(endpoint)?;
        }
        if let Some(ref contract) = self.contract {
            settings.contract = contract
                .parse::<UploadContract>()
                .map_err(ConfigError::InvalidContract)?;
        }
        if let Some(ref dir) = self.download_dir {
            let path = shellexpand::tilde(dir);
            settings.download_dir = PathBuf::from(path.as_ref());
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        Ok(())
    }
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("audiencer")
        .join("config.toml")
}

/// Load settings from the configuration file, if any.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let config = Config::load(path)?;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings)?;
    Ok(settings)
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("invalid contract: {0}")]
    InvalidContract(String),
}
