// # Control-server HTTP client
//
// This crate implements the `ControlPlane` seam against the control
// server's REST API:
//
// - `POST /api/register` — announce the device (10s timeout)
// - `POST /api/status` — heartbeat, response ignored (10s timeout)
// - `GET /api/commands/{device_id}` — pending commands (5s timeout)
// - `POST /api/report/ip_change` — rotation outcome (10s timeout)
//
// The client is stateless and single-shot: one HTTP call per method, no
// retries, no caching. Whether a failure is swallowed or backed off is
// the agent loop's decision, not this crate's.

use std::time::Duration;

use async_trait::async_trait;
use rotip_core::traits::{Command, ControlPlane, IpChangeReport, Registration, StatusUpdate};
use rotip_core::{Error, Result};
use serde::Deserialize;
use tracing::debug;

/// Timeout for registration and report calls
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the command fetch (it runs on a tight cadence)
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Wire shape of the commands endpoint response
#[derive(Debug, Deserialize)]
struct CommandsResponse {
    #[serde(default)]
    commands: Vec<CommandEnvelope>,
}

/// One command object; parameters beyond the name are currently unused
#[derive(Debug, Deserialize)]
struct CommandEnvelope {
    command: String,
}

/// ControlPlane implementation over reqwest
pub struct HttpControlPlane {
    /// Server base URL without a trailing slash
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpControlPlane {
    /// Create a client for the given server base URL
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            base_url: server_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and require a successful status
    async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
        timeout: Duration,
    ) -> Result<()> {
        let url = self.endpoint(path);
        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::control_plane(format!("POST {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(Error::control_plane(format!(
                "POST {} returned {}",
                path,
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn register(&self, registration: &Registration) -> Result<()> {
        debug!(device_id = %registration.device_id, "Registering device");
        self.post_json("/api/register", registration, DEFAULT_TIMEOUT)
            .await
    }

    async fn send_status(&self, status: &StatusUpdate) -> Result<()> {
        self.post_json("/api/status", status, DEFAULT_TIMEOUT).await
    }

    async fn fetch_commands(&self, device_id: &str) -> Result<Vec<Command>> {
        let url = self.endpoint(&format!("/api/commands/{}", device_id));
        let response = self
            .client
            .get(&url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::control_plane(format!("Command fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::control_plane(format!(
                "Command fetch returned {}",
                response.status()
            )));
        }

        let parsed: CommandsResponse = response
            .json()
            .await
            .map_err(|e| Error::control_plane(format!("Malformed commands response: {}", e)))?;

        Ok(parsed
            .commands
            .iter()
            .map(|envelope| Command::from_wire(&envelope.command))
            .collect())
    }

    async fn report_ip_change(&self, report: &IpChangeReport) -> Result<()> {
        debug!(
            device_id = %report.device_id,
            success = report.success,
            "Reporting IP change"
        );
        self.post_json("/api/report/ip_change", report, DEFAULT_TIMEOUT)
            .await
    }
}
