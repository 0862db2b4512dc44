//! IP-rotation controller
//!
//! The controller drives the airplane-mode cycle and confirms that it
//! actually produced a new carrier-assigned public IP.
//!
//! ## Phase machine
//!
//! ```text
//! Idle ──▶ TogglingRadio ──▶ ConfirmingNewIp ──▶ Confirmed
//!                                   │
//!                                   └──────────▶ TimedOut
//! ```
//!
//! The radio reset is asynchronous and has no completion signal from the
//! platform, so "success" is defined operationally: a new publicly visible
//! IP was observed within the confirmation budget. Terminal phases always
//! produce an [`IpChangeResult`]; the controller never returns an error.
//! Toggle failures, resolver failures and history-store failures all
//! degrade into the `success: false` / `"Failed"` branch of the result.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::RotationConfig;
use crate::traits::{IpHistoryStore, PlatformControl, PublicIpResolver};

/// Placeholder reported when the pre-rotation IP could not be resolved
pub const UNKNOWN_IP: &str = "Unknown";

/// Placeholder reported when no IP could be confirmed after the rotation
pub const FAILED_IP: &str = "Failed";

/// Phase of a rotation attempt, logged for observability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPhase {
    Idle,
    TogglingRadio,
    ConfirmingNewIp,
    Confirmed,
    TimedOut,
}

impl RotationPhase {
    fn as_str(&self) -> &'static str {
        match self {
            RotationPhase::Idle => "idle",
            RotationPhase::TogglingRadio => "toggling_radio",
            RotationPhase::ConfirmingNewIp => "confirming_new_ip",
            RotationPhase::Confirmed => "confirmed",
            RotationPhase::TimedOut => "timed_out",
        }
    }
}

/// Outcome of one rotation attempt
///
/// Created per attempt, reported to the control server once, then
/// discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct IpChangeResult {
    /// IP before the cycle, or `"Unknown"` if it could not be resolved
    pub old_ip: String,
    /// Confirmed IP after the cycle, or `"Failed"` on timeout
    pub new_ip: String,
    /// True iff a new IP was confirmed and it differs from `old_ip`
    pub success: bool,
    /// Wall time of the whole attempt
    pub duration: Duration,
}

impl IpChangeResult {
    /// Duration in float seconds, as reported on the wire
    pub fn duration_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// Drives the radio cycle and the bounded confirmation loop
pub struct IpRotationController {
    resolver: Arc<dyn PublicIpResolver>,
    platform: Arc<dyn PlatformControl>,
    history: Arc<dyn IpHistoryStore>,
    config: RotationConfig,
}

impl IpRotationController {
    /// Create a new rotation controller
    pub fn new(
        resolver: Arc<dyn PublicIpResolver>,
        platform: Arc<dyn PlatformControl>,
        history: Arc<dyn IpHistoryStore>,
        config: RotationConfig,
    ) -> Self {
        Self {
            resolver,
            platform,
            history,
            config,
        }
    }

    /// Rotate the public IP and confirm the change
    ///
    /// Always completes within the settle delays plus
    /// `max_confirm_attempts × confirm_poll_interval` and always returns a
    /// result; see the module docs for the failure semantics.
    pub async fn rotate(&self) -> IpChangeResult {
        let started = tokio::time::Instant::now();

        let old_ip = match self.resolver.resolve().await {
            Ok(ip) => ip.to_string(),
            Err(e) => {
                debug!(error = %e, "Could not resolve IP before rotation");
                UNKNOWN_IP.to_string()
            }
        };
        info!(%old_ip, "Starting IP rotation");

        self.cycle_radio().await;

        match self.confirm_new_ip().await {
            Some(new_ip) => {
                self.record_observed(&new_ip).await;

                // A confirmed IP equal to the old one means the carrier
                // handed the same address back; that is a failed rotation.
                let success = new_ip != old_ip;
                let duration = started.elapsed();
                info!(
                    phase = RotationPhase::Confirmed.as_str(),
                    %old_ip,
                    %new_ip,
                    success,
                    duration_secs = duration.as_secs_f64(),
                    "Rotation finished"
                );

                IpChangeResult {
                    old_ip,
                    new_ip,
                    success,
                    duration,
                }
            }
            None => {
                let duration = started.elapsed();
                warn!(
                    phase = RotationPhase::TimedOut.as_str(),
                    %old_ip,
                    attempts = self.config.max_confirm_attempts,
                    duration_secs = duration.as_secs_f64(),
                    "No IP confirmed within the attempt budget"
                );

                IpChangeResult {
                    old_ip,
                    new_ip: FAILED_IP.to_string(),
                    success: false,
                    duration,
                }
            }
        }
    }

    /// Run the privileged toggle sequence
    ///
    /// Failures here never abort the rotation: the radio may still cycle
    /// even when a command reports an error, and the confirmation loop is
    /// the actual arbiter of the outcome.
    async fn cycle_radio(&self) {
        debug!(phase = RotationPhase::TogglingRadio.as_str(), "Cycling radio");

        if let Err(e) = self.platform.set_airplane_mode(true).await {
            warn!(error = %e, "Failed to enable airplane mode, continuing");
        }
        tokio::time::sleep(self.config.settle_on()).await;

        if let Err(e) = self.platform.set_airplane_mode(false).await {
            warn!(error = %e, "Failed to disable airplane mode, continuing");
        }
        tokio::time::sleep(self.config.settle_off()).await;

        if let Err(e) = self.platform.reset_mobile_data().await {
            warn!(error = %e, "Failed to reset mobile data, continuing");
        }
    }

    /// Poll the resolver until an IP is obtained or the budget runs out
    async fn confirm_new_ip(&self) -> Option<String> {
        debug!(
            phase = RotationPhase::ConfirmingNewIp.as_str(),
            attempts = self.config.max_confirm_attempts,
            "Waiting for a resolvable IP"
        );

        for attempt in 1..=self.config.max_confirm_attempts {
            match self.resolver.resolve().await {
                Ok(ip) => {
                    debug!(attempt, ip = %ip, "IP confirmed");
                    return Some(ip.to_string());
                }
                Err(e) => {
                    debug!(
                        attempt,
                        max = self.config.max_confirm_attempts,
                        error = %e,
                        "IP not yet resolvable"
                    );
                }
            }
            tokio::time::sleep(self.config.confirm_poll_interval()).await;
        }

        None
    }

    /// Record the confirmed IP in the dedup history
    ///
    /// Store failures are logged and swallowed: the history is a
    /// statistics aid, not part of the rotation outcome.
    async fn record_observed(&self, ip: &str) {
        match self.history.record(ip).await {
            Ok(true) => match self.history.count().await {
                Ok(total) => info!(ip, total, "Recorded new IP in history"),
                Err(_) => info!(ip, "Recorded new IP in history"),
            },
            Ok(false) => debug!(ip, "IP already present in history"),
            Err(e) => warn!(error = %e, ip, "Failed to record IP in history"),
        }
    }
}
