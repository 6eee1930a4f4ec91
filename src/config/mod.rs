// Configuration management
use crate::error::{Result, TrackerError};
use crate::expiry::{ExpiryPolicy, DEFAULT_REFRESH_MINUTES, DEFAULT_WARN_MINUTES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const API_URL_ENV: &str = "JORNADA_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    #[serde(default = "default_warn_minutes")]
    pub warn_minutes: i64,
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: i64,
}

fn default_check_interval_secs() -> u64 {
    60
}

fn default_warn_minutes() -> i64 {
    DEFAULT_WARN_MINUTES
}

fn default_refresh_minutes() -> i64 {
    DEFAULT_REFRESH_MINUTES
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            warn_minutes: default_warn_minutes(),
            refresh_minutes: default_refresh_minutes(),
        }
    }
}

impl SessionConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy {
            warn_at_minutes: self.warn_minutes,
            refresh_at_minutes: self.refresh_minutes,
        }
    }
}

impl Config {
    /// Get the config directory path
    ///
    /// Priority:
    /// 1. XDG_CONFIG_HOME/jornada (if env var is set)
    /// 2. ~/.config/jornada (if ~/.config exists)
    /// 3. ~/.jornada (fallback on Unix, doesn't create ~/.config)
    /// 4. Platform default on Windows
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config).join("jornada"));
        }

        #[cfg(unix)]
        {
            if let Some(home_dir) = dirs::home_dir() {
                let xdg_config = home_dir.join(".config");

                if xdg_config.exists() {
                    return Ok(xdg_config.join("jornada"));
                }

                return Ok(home_dir.join(".jornada"));
            }
        }

        #[cfg(not(unix))]
        {
            if let Some(config_dir) = dirs::config_dir() {
                return Ok(config_dir.join("jornada"));
            }
        }

        Err(TrackerError::ConfigError(
            "Could not determine config directory".to_string(),
        ))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, environment variables, and defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        let mut config = if config_path.exists() {
            tracing::debug!("Loading config from: {}", config_path.display());
            let contents = fs::read_to_string(&config_path).map_err(|e| {
                TrackerError::ConfigError(format!("Failed to read config file: {}", e))
            })?;
            Self::parse(&contents)?
        } else {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Config::default()
        };

        if let Ok(base_url) = std::env::var(API_URL_ENV) {
            tracing::debug!("Using {} from environment: {}", API_URL_ENV, base_url);
            config.api.base_url = Some(base_url);
        }

        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.session.refresh_minutes > self.session.warn_minutes {
            return Err(TrackerError::InvalidConfig(format!(
                "session.refresh_minutes ({}) must not exceed session.warn_minutes ({})",
                self.session.refresh_minutes, self.session.warn_minutes
            )));
        }
        if self.session.refresh_minutes < 0 {
            return Err(TrackerError::InvalidConfig(
                "session.refresh_minutes must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a sample config file with comments
    pub fn create_sample() -> Result<()> {
        let config_dir = Self::config_dir()?;
        let config_path = Self::config_file_path()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| {
                TrackerError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Don't overwrite existing config
        if config_path.exists() {
            return Err(TrackerError::ConfigError(format!(
                "Config file already exists at: {}",
                config_path.display()
            )));
        }

        fs::write(&config_path, SAMPLE_CONFIG).map_err(|e| {
            TrackerError::ConfigError(format!("Failed to write sample config: {}", e))
        })?;

        println!("Created sample config file at: {}", config_path.display());
        println!("\nPlease edit the file and set the backend URL:");
        println!("  base_url = \"https://produccion.example.com/api\"");

        Ok(())
    }

    /// Backend URL, required by every command that talks to the server
    pub fn base_url(&self) -> Result<&str> {
        self.api
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                TrackerError::InvalidConfig(format!(
                    "Backend URL is required. Provide --api-url, set {}, or configure api.base_url in the config file",
                    API_URL_ENV
                ))
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }
}

const SAMPLE_CONFIG: &str = r#"# Jornada client configuration
# Location priority:
#   1. $XDG_CONFIG_HOME/jornada/config.toml (if XDG_CONFIG_HOME is set)
#   2. ~/.config/jornada/config.toml (if ~/.config exists)
#   3. ~/.jornada/config.toml (fallback)
#
# The backend URL can also be set via the JORNADA_API_URL environment variable.

[api]
# Base URL of the production-tracking backend (required)
# Example: base_url = "https://produccion.example.com/api"
base_url = ""

# HTTP request timeout in seconds (default: 10)
timeout_secs = 10

[session]
# How often the session monitor checks the access token, in seconds (default: 60)
check_interval_secs = 60

# Warn once when this many minutes or fewer remain (default: 3)
warn_minutes = 3

# Renew the access token when this many minutes or fewer remain (default: 2)
refresh_minutes = 2
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.session.check_interval(), Duration::from_secs(60));
        assert_eq!(config.session.expiry_policy(), ExpiryPolicy::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.base_url().is_err());
    }

    #[test]
    fn test_sample_config_parses() {
        let config = Config::parse(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.session.warn_minutes, 3);
        assert_eq!(config.session.refresh_minutes, 2);
        // Empty URL in the sample counts as unset
        assert!(config.base_url().is_err());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = Config::parse(
            r#"
            [api]
            base_url = "http://localhost:5000/api"
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url().unwrap(), "http://localhost:5000/api");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.session.check_interval_secs, 60);
    }

    #[test]
    fn test_rejects_inverted_watermarks() {
        let result = Config::parse(
            r#"
            [session]
            warn_minutes = 1
            refresh_minutes = 5
            "#,
        );
        assert!(matches!(result, Err(TrackerError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_mistyped_field() {
        let result = Config::parse(
            r#"
            [session]
            check_interval_secs = "often"
            "#,
        );
        let err = result.unwrap_err();
        assert!(matches!(err, TrackerError::Toml(_)));
        assert!(err.to_string().starts_with("TOML parse error"));
    }

    #[test]
    fn test_rejects_invalid_toml() {
        assert!(matches!(
            Config::parse("[api"),
            Err(TrackerError::Toml(_))
        ));
    }
}
