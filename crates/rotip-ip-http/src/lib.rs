// # HTTP IP-echo resolver
//
// This crate provides the HTTP-based public-IP resolver for the rotip
// agent.
//
// ## Behavior
//
// A small ordered list of independent IP-echo services is tried in turn;
// the first response that is HTTP 200 and a syntactically valid IPv4
// dotted quad wins. Any failure (timeout, non-200 status, malformed body)
// falls through to the next service without surfacing to the caller. When
// the whole list is exhausted, one external-process fallback (`curl`) is
// attempted before giving up.
//
// The resolver performs no retries of its own beyond the service list:
// retry timing is owned by the rotation controller.

use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use rotip_core::traits::PublicIpResolver;
use rotip_core::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Default per-service request timeout
const DEFAULT_SERVICE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for the external-process fallback
const PROCESS_FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Default IP-echo services, in fallback order
const DEFAULT_IP_SERVICES: &[&str] = &[
    "https://api.ipify.org",
    "https://ifconfig.me/ip",
    "https://icanhazip.com",
];

/// Argument vector for the external-process fallback
const FALLBACK_COMMAND: &[&str] = &["curl", "-s", "ifconfig.me"];

/// HTTP-based public-IP resolver with service fallback
pub struct HttpIpResolver {
    /// Ordered list of IP-echo service URLs
    services: Vec<String>,

    /// Per-service request timeout
    service_timeout: Duration,

    /// Whether to shell out to `curl` after the service list is exhausted
    process_fallback: bool,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver over the default service list
    pub fn new() -> Self {
        Self::with_services(
            DEFAULT_IP_SERVICES.iter().map(|s| s.to_string()).collect(),
            DEFAULT_SERVICE_TIMEOUT,
        )
    }

    /// Create a resolver over a custom service list
    pub fn with_services(services: Vec<String>, service_timeout: Duration) -> Self {
        Self {
            services,
            service_timeout,
            process_fallback: true,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Disable the external-process fallback (used by tests)
    pub fn without_process_fallback(mut self) -> Self {
        self.process_fallback = false;
        self
    }

    /// Fetch and validate an IP from one echo service
    async fn fetch_from(&self, url: &str) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(url)
            .timeout(self.service_timeout)
            .send()
            .await
            .map_err(|e| Error::resolve(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::resolve(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::resolve(format!("Failed to read response: {}", e)))?;

        parse_ipv4(&body)
            .ok_or_else(|| Error::resolve(format!("Invalid IPv4 in body: {:?}", body.trim())))
    }

    /// Last resort: shell out to a generic IP-echo command
    async fn fetch_via_process(&self) -> Result<Ipv4Addr> {
        let output = tokio::time::timeout(
            PROCESS_FALLBACK_TIMEOUT,
            Command::new(FALLBACK_COMMAND[0])
                .args(&FALLBACK_COMMAND[1..])
                .stdin(Stdio::null())
                .output(),
        )
        .await
        .map_err(|_| Error::resolve("IP-echo process timed out"))?
        .map_err(|e| Error::resolve(format!("IP-echo process failed to start: {}", e)))?;

        if !output.status.success() {
            return Err(Error::resolve(format!(
                "IP-echo process exited with {}",
                output.status
            )));
        }

        let body = String::from_utf8_lossy(&output.stdout);
        parse_ipv4(&body).ok_or_else(|| Error::resolve("IP-echo process output is not an IPv4"))
    }
}

impl Default for HttpIpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PublicIpResolver for HttpIpResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        for url in &self.services {
            match self.fetch_from(url).await {
                Ok(ip) => {
                    debug!(service = %url, ip = %ip, "Resolved public IP");
                    return Ok(ip);
                }
                Err(e) => {
                    debug!(service = %url, error = %e, "IP echo service failed, trying next");
                }
            }
        }

        if self.process_fallback {
            match self.fetch_via_process().await {
                Ok(ip) => {
                    debug!(ip = %ip, "Resolved public IP via process fallback");
                    return Ok(ip);
                }
                Err(e) => {
                    debug!(error = %e, "Process fallback failed");
                }
            }
        }

        Err(Error::resolve("All IP-echo sources failed"))
    }
}

/// Validate and parse a dotted-quad IPv4 body
///
/// Accepts exactly four dot-separated octets in 0–255, surrounded by
/// optional whitespace. Everything else (HTML error pages, IPv6, empty
/// bodies) is rejected so it falls through to the next service.
fn parse_ipv4(body: &str) -> Option<Ipv4Addr> {
    body.trim().parse::<Ipv4Addr>().ok()
}
