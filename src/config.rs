use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod paths {
    //! Path resolution for the chirp home directory.
    //!
    //! Resolution order: the CHIRP_HOME environment variable if set,
    //! otherwise ~/.config/chirp.

    use std::path::PathBuf;

    pub fn chirp_home() -> PathBuf {
        if let Ok(home) = std::env::var("CHIRP_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("chirp"))
            .unwrap_or_else(|| PathBuf::from(".chirp"))
    }

    pub fn config_path() -> PathBuf {
        chirp_home().join("config.toml")
    }

    /// Where the session token pair is persisted between runs.
    pub fn tokens_path() -> PathBuf {
        chirp_home().join("auth_tokens.json")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the micro-blogging API server
    pub api_base_url: String,

    /// Period of the background token refresh timer, in seconds.
    /// Must stay comfortably below the access token lifetime.
    pub refresh_interval_secs: u64,

    /// Timeout applied to every HTTP request, in seconds
    pub request_timeout_secs: u64,

    /// How many tweets the side lists show before "see more"
    pub side_list_limit: usize,
}

impl Config {
    const DEFAULT_API_BASE_URL: &'static str = "http://127.0.0.1:8000";
    const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 240;
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
    const DEFAULT_SIDE_LIST_LIMIT: usize = 3;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            refresh_interval_secs: Self::DEFAULT_REFRESH_INTERVAL_SECS,
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            side_list_limit: Self::DEFAULT_SIDE_LIST_LIMIT,
        }
    }
}
