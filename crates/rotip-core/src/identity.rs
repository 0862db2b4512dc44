//! Device identity derivation
//!
//! A device needs a stable identifier before it can register with the
//! control server. Derivation is best-effort and never fails; it walks a
//! three-tier fallback chain:
//!
//! 1. Termux telephony: `termux-telephony-deviceinfo` (5s timeout), using
//!    the last 8 characters of the reported device id
//! 2. Hostname, truncated to 10 characters
//! 3. Timestamp-derived identifier (last resort, not stable across runs)
//!
//! The identity is derived once at startup and never mutated afterwards.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command as ProcessCommand;

/// Marker path that identifies a Termux environment
const TERMUX_PREFIX: &str = "/data/data/com.termux";

/// Timeout for the telephony info utility
const TELEPHONY_TIMEOUT: Duration = Duration::from_secs(5);

/// Platform classification reported to the control server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Termux,
    Linux,
    Windows,
    Macos,
    Unknown,
}

impl Platform {
    /// Wire name of the platform
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Termux => "termux",
            Platform::Linux => "linux",
            Platform::Windows => "windows",
            Platform::Macos => "macos",
            Platform::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of this device
///
/// Created once at agent startup; immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Stable identifier, always non-empty
    pub device_id: String,
    /// Operator-chosen display name (from configuration)
    pub device_name: String,
    /// Platform classification
    pub platform: Platform,
}

impl DeviceIdentity {
    /// Derive the device identity
    ///
    /// This never fails; each tier degrades to the next on any error.
    pub async fn identify(device_name: impl Into<String>) -> Self {
        let platform = detect_platform();
        let device_id = derive_device_id(platform).await;

        Self {
            device_id,
            device_name: device_name.into(),
            platform,
        }
    }
}

/// Classify the platform this agent runs on
pub fn detect_platform() -> Platform {
    if Path::new(TERMUX_PREFIX).exists() {
        return Platform::Termux;
    }

    match std::env::consts::OS {
        "linux" => Platform::Linux,
        "windows" => Platform::Windows,
        "macos" => Platform::Macos,
        _ => Platform::Unknown,
    }
}

/// Walk the identifier fallback chain
async fn derive_device_id(platform: Platform) -> String {
    if platform == Platform::Termux {
        match telephony_device_id().await {
            Some(id) => return id,
            None => {
                tracing::debug!("Telephony device id unavailable, falling back to hostname");
            }
        }
    }

    if let Some(id) = hostname_device_id() {
        return id;
    }

    timestamp_device_id()
}

/// Tier 1: ask the Termux telephony utility for the hardware device id
async fn telephony_device_id() -> Option<String> {
    let output = tokio::time::timeout(
        TELEPHONY_TIMEOUT,
        ProcessCommand::new("termux-telephony-deviceinfo").output(),
    )
    .await
    .ok()?
    .ok()?;

    if !output.status.success() {
        return None;
    }

    let info: serde_json::Value = serde_json::from_slice(&output.stdout).ok()?;
    let device_id = info.get("device_id")?.as_str()?;
    if device_id.is_empty() {
        return None;
    }

    let tail_start = device_id.len().saturating_sub(8);
    Some(format!("Phone_{}", &device_id[tail_start..]))
}

/// Default operator-visible device name (`Device_<hostname>`)
///
/// Used when a config file is created on first run.
pub fn default_device_name() -> String {
    hostname_device_id().unwrap_or_else(timestamp_device_id)
}

/// Tier 2: hostname-derived identifier
fn hostname_device_id() -> Option<String> {
    let name = hostname::get().ok()?;
    let name = name.to_string_lossy();
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let short: String = name.chars().take(10).collect();
    Some(format!("Device_{}", short))
}

/// Tier 3: timestamp-derived identifier, used only when everything else failed
fn timestamp_device_id() -> String {
    let now = chrono::Utc::now().timestamp() as u64;
    format!("Device_{}", now % 100_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identify_never_returns_empty_id() {
        let identity = DeviceIdentity::identify("Device_test").await;
        assert!(!identity.device_id.is_empty());
        assert_eq!(identity.device_name, "Device_test");
    }

    #[test]
    fn timestamp_id_has_prefix() {
        let id = timestamp_device_id();
        assert!(id.starts_with("Device_"));
        assert!(id.len() > "Device_".len());
    }

    #[test]
    fn platform_wire_names() {
        assert_eq!(Platform::Termux.as_str(), "termux");
        assert_eq!(Platform::Macos.to_string(), "macos");

        let json = serde_json::to_string(&Platform::Linux).unwrap();
        assert_eq!(json, "\"linux\"");
    }
}
