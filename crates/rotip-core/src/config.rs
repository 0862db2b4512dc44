//! Configuration types for the rotip agent
//!
//! The agent is configured by a single JSON file (the original deployment
//! keeps it at `config/config.json`). The file is loaded once at startup
//! into an [`AgentConfig`] which is then passed by reference into the
//! components that need it; there is no ambient global configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main agent configuration
///
/// Recognized on-disk fields: `server_url`, `device_name`, `history_path`,
/// `auto_connect`, `last_connected`, plus the optional `agent` and
/// `rotation` sections. Unknown fields are ignored so the file can be
/// shared with other tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the control server (e.g., "http://203.0.113.10:8000")
    pub server_url: String,

    /// Human-readable device name reported at registration
    pub device_name: String,

    /// Path to the line-oriented IP history file
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,

    /// Whether the daemon should connect without operator confirmation
    #[serde(default)]
    pub auto_connect: bool,

    /// When the agent last started a session (RFC 3339), maintained by the
    /// daemon, informational only
    #[serde(default)]
    pub last_connected: Option<chrono::DateTime<chrono::Utc>>,

    /// Command-loop cadence settings
    #[serde(default)]
    pub agent: LoopConfig,

    /// IP-rotation timing settings
    #[serde(default)]
    pub rotation: RotationConfig,
}

impl AgentConfig {
    /// Create a configuration with defaults for everything but the server URL
    pub fn new(server_url: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            device_name: device_name.into(),
            history_path: default_history_path(),
            auto_connect: false,
            last_connected: None,
            agent: LoopConfig::default(),
            rotation: RotationConfig::default(),
        }
    }

    /// Load configuration from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AgentConfig = serde_json::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(config)
    }

    /// Write configuration to a JSON file, creating parent directories
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await.map_err(|e| {
            Error::config(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server_url.is_empty() {
            return Err(Error::config("server_url cannot be empty"));
        }

        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(Error::config(format!(
                "server_url must use http or https scheme, got: {}",
                self.server_url
            )));
        }

        if self.device_name.is_empty() {
            return Err(Error::config("device_name cannot be empty"));
        }

        self.agent.validate()?;
        self.rotation.validate()?;

        Ok(())
    }

    /// Server URL with any trailing slash removed
    pub fn server_url_trimmed(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}

/// Command-loop cadence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Interval between command fetches (in seconds)
    #[serde(default = "default_command_interval_secs")]
    pub command_interval_secs: u64,

    /// Interval between heartbeats (in seconds)
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,

    /// Sleep between loop ticks (in milliseconds)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Backoff after an unexpected tick error (in seconds)
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
}

impl LoopConfig {
    /// Validate the loop configuration
    pub fn validate(&self) -> Result<()> {
        if self.command_interval_secs == 0 {
            return Err(Error::config("command_interval_secs must be > 0"));
        }
        if self.status_interval_secs == 0 {
            return Err(Error::config("status_interval_secs must be > 0"));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::config("tick_interval_ms must be > 0"));
        }
        Ok(())
    }

    /// Interval between command fetches
    pub fn command_interval(&self) -> Duration {
        Duration::from_secs(self.command_interval_secs)
    }

    /// Interval between heartbeats
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    /// Sleep between loop ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Backoff after an unexpected tick error
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            command_interval_secs: default_command_interval_secs(),
            status_interval_secs: default_status_interval_secs(),
            tick_interval_ms: default_tick_interval_ms(),
            error_backoff_secs: default_error_backoff_secs(),
        }
    }
}

/// IP-rotation timing configuration
///
/// The defaults reproduce the field-tested radio cycle: airplane mode on,
/// 3s settle, airplane mode off, 4s settle, then up to 15 confirmation
/// polls at 2s intervals (~37s worst-case wall time for the whole attempt).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Settle time after enabling airplane mode (in milliseconds)
    #[serde(default = "default_settle_on_ms")]
    pub settle_on_ms: u64,

    /// Settle time after disabling airplane mode (in milliseconds)
    #[serde(default = "default_settle_off_ms")]
    pub settle_off_ms: u64,

    /// Maximum confirmation attempts before giving up
    #[serde(default = "default_max_confirm_attempts")]
    pub max_confirm_attempts: usize,

    /// Delay between confirmation attempts (in milliseconds)
    #[serde(default = "default_confirm_poll_ms")]
    pub confirm_poll_ms: u64,
}

impl RotationConfig {
    /// Validate the rotation configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_confirm_attempts == 0 {
            return Err(Error::config("max_confirm_attempts must be > 0"));
        }
        Ok(())
    }

    /// Settle time after enabling airplane mode
    pub fn settle_on(&self) -> Duration {
        Duration::from_millis(self.settle_on_ms)
    }

    /// Settle time after disabling airplane mode
    pub fn settle_off(&self) -> Duration {
        Duration::from_millis(self.settle_off_ms)
    }

    /// Delay between confirmation attempts
    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_ms)
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            settle_on_ms: default_settle_on_ms(),
            settle_off_ms: default_settle_off_ms(),
            max_confirm_attempts: default_max_confirm_attempts(),
            confirm_poll_ms: default_confirm_poll_ms(),
        }
    }
}

fn default_history_path() -> PathBuf {
    PathBuf::from("settings/total_ips.txt")
}

fn default_command_interval_secs() -> u64 {
    5
}

fn default_status_interval_secs() -> u64 {
    30
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_error_backoff_secs() -> u64 {
    5
}

fn default_settle_on_ms() -> u64 {
    3000
}

fn default_settle_off_ms() -> u64 {
    4000
}

fn default_max_confirm_attempts() -> usize {
    15
}

fn default_confirm_poll_ms() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AgentConfig::new("http://localhost:8000", "Device_test");
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.command_interval(), Duration::from_secs(5));
        assert_eq!(config.agent.status_interval(), Duration::from_secs(30));
        assert_eq!(config.rotation.max_confirm_attempts, 15);
    }

    #[test]
    fn rejects_bad_server_url() {
        let mut config = AgentConfig::new("localhost:8000", "Device_test");
        assert!(config.validate().is_err());

        config.server_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_minimal_file() {
        let json = r#"{
            "server_url": "http://203.0.113.10:8000",
            "device_name": "Device_phone01",
            "auto_connect": true
        }"#;

        let config: AgentConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.auto_connect);
        assert_eq!(config.history_path, PathBuf::from("settings/total_ips.txt"));
        assert_eq!(config.rotation.settle_on(), Duration::from_secs(3));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{
            "server_url": "http://localhost:8000",
            "device_name": "d",
            "albakgi_interval": 300
        }"#;

        assert!(serde_json::from_str::<AgentConfig>(json).is_ok());
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("config.json");

        let mut config = AgentConfig::new("http://localhost:8000", "Device_test");
        config.auto_connect = true;
        config.save(&path).await.unwrap();

        let loaded = AgentConfig::load(&path).await.unwrap();
        assert_eq!(loaded.server_url, config.server_url);
        assert!(loaded.auto_connect);
    }
}
