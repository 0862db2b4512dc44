//! Control-plane trait and wire types
//!
//! The control server is consumed through this interface only. Each method
//! maps to exactly one HTTP call; retries, cadences and error swallowing
//! are owned by the agent command loop, never by the client.
//!
//! ## Wire contract
//!
//! - `POST /api/register` — [`Registration`] body, 200 = success
//! - `POST /api/status` — [`StatusUpdate`] body, response ignored
//! - `GET /api/commands/{device_id}` — `{"commands": [{"command": ...}]}`
//! - `POST /api/report/ip_change` — [`IpChangeReport`] body

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A command issued by the control server
///
/// Commands arrive as `{"command": "<name>", ...}` objects. Parameters are
/// currently empty for every known command; unrecognized names are carried
/// through so the loop can log and skip them instead of failing the fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Rotate the public IP via the radio cycle
    ChangeIp,
    /// Liveness probe: send an immediate heartbeat
    Test,
    /// Stop the agent loop after the current tick
    Stop,
    /// A command name this agent version does not understand
    Unknown(String),
}

impl Command {
    /// Map a wire command name to a [`Command`]
    pub fn from_wire(name: &str) -> Self {
        match name {
            "change_ip" => Command::ChangeIp,
            "test" => Command::Test,
            "stop" => Command::Stop,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Registration payload sent once at session start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub device_id: String,
    pub device_name: String,
    pub current_ip: String,
    pub platform: String,
}

/// Heartbeat payload sent on the status cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub device_id: String,
    pub current_ip: String,
    pub status: String,
}

impl StatusUpdate {
    /// Build an "online" status update
    pub fn online(device_id: impl Into<String>, current_ip: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            current_ip: current_ip.into(),
            status: "online".to_string(),
        }
    }
}

/// Rotation outcome report posted after a `change_ip` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpChangeReport {
    pub device_id: String,
    pub old_ip: String,
    pub new_ip: String,
    pub change_duration: f64,
    pub success: bool,
    /// RFC 3339 timestamp taken when the report is built
    pub timestamp: String,
}

/// Trait for control-server client implementations
///
/// Implementations are stateless and single-shot: one HTTP call per
/// method, a per-call timeout, no retries, no caching. Every failure is
/// surfaced as an `Err` for the command loop to pattern-match; whether a
/// failure is swallowed (heartbeat, fetch) or logged (registration,
/// report) is the loop's decision.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Register the device with the control server
    async fn register(&self, registration: &Registration) -> Result<(), crate::Error>;

    /// Post a liveness heartbeat; the response body is ignored
    async fn send_status(&self, status: &StatusUpdate) -> Result<(), crate::Error>;

    /// Fetch pending commands for a device
    ///
    /// An empty list is the normal case.
    async fn fetch_commands(&self, device_id: &str) -> Result<Vec<Command>, crate::Error>;

    /// Report the outcome of a rotation attempt
    async fn report_ip_change(&self, report: &IpChangeReport) -> Result<(), crate::Error>;
}
