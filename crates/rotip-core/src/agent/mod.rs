//! Agent command loop
//!
//! The loop owns the poll/execute/report cycle against the control server:
//! registration at startup, a heartbeat cadence, a command-fetch cadence,
//! and serial dispatch of fetched commands.
//!
//! ## Loop shape
//!
//! One cooperative loop, two independent deadlines compared against a
//! monotonic clock (`tokio::time::Instant`). Commands are fetched every 5s
//! and heartbeats sent every 30s by default; whichever is due on a tick
//! fires, then the loop sleeps briefly. There is no preemption: a
//! long-running rotation blocks the tick it runs in, and both cadences
//! slip until it finishes.
//!
//! No error terminates the loop. Transient control-server failures are
//! swallowed where liveness allows it (heartbeat, fetch) and anything
//! unexpected is logged and followed by a longer backoff sleep. The loop
//! exits only on a `stop` command or external cancellation.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::LoopConfig;
use crate::error::Result;
use crate::identity::DeviceIdentity;
use crate::rotation::{IpRotationController, UNKNOWN_IP};
use crate::traits::{Command, ControlPlane, IpChangeReport, PublicIpResolver, Registration,
                    StatusUpdate};

/// Transient per-session state
///
/// Lives for the duration of one `run()` invocation and is reset when a
/// new session starts.
#[derive(Debug)]
struct AgentSession {
    running: bool,
    current_ip: String,
    next_command: Instant,
    next_status: Instant,
}

impl AgentSession {
    fn start() -> Self {
        let now = Instant::now();
        Self {
            running: true,
            current_ip: UNKNOWN_IP.to_string(),
            // Both cadences are due immediately on the first tick
            next_command: now,
            next_status: now,
        }
    }
}

/// The agent's poll/execute/report loop
pub struct AgentCommandLoop {
    identity: DeviceIdentity,
    control: Arc<dyn ControlPlane>,
    resolver: Arc<dyn PublicIpResolver>,
    rotation: IpRotationController,
    config: LoopConfig,
    session: AgentSession,
}

impl AgentCommandLoop {
    /// Create a new command loop
    pub fn new(
        identity: DeviceIdentity,
        control: Arc<dyn ControlPlane>,
        resolver: Arc<dyn PublicIpResolver>,
        rotation: IpRotationController,
        config: LoopConfig,
    ) -> Self {
        Self {
            identity,
            control,
            resolver,
            rotation,
            config,
            session: AgentSession::start(),
        }
    }

    /// Run the loop until a `stop` command or SIGINT
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the loop with a controlled shutdown signal
    ///
    /// Tests drive shutdown through the oneshot channel; the daemon uses
    /// [`run()`](Self::run), which listens for OS signals instead.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&mut self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.session = AgentSession::start();

        info!(
            device_id = %self.identity.device_id,
            device_name = %self.identity.device_name,
            platform = %self.identity.platform,
            "Agent starting"
        );

        self.refresh_current_ip().await;

        // Registration is attempted once; a failure is not fatal, the
        // server learns about us from subsequent heartbeats.
        if let Err(e) = self.register().await {
            warn!(error = %e, "Registration failed, continuing without it");
        }

        if let Some(mut rx) = shutdown_rx {
            while self.session.running {
                tokio::select! {
                    _ = &mut rx => {
                        info!("Shutdown signal received");
                        break;
                    }
                    _ = self.tick() => {}
                }
            }
        } else {
            while self.session.running {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupt received");
                        break;
                    }
                    _ = self.tick() => {}
                }
            }
        }

        info!("Agent stopped");
        Ok(())
    }

    /// One pass over the two cadences
    async fn tick(&mut self) {
        let now = Instant::now();

        if now >= self.session.next_command {
            self.session.next_command = now + self.config.command_interval();
            if let Err(e) = self.check_commands().await {
                warn!(error = %e, "Tick failed, backing off");
                tokio::time::sleep(self.config.error_backoff()).await;
                return;
            }
        }

        // A stop processed above must not be followed by another call-out
        if !self.session.running {
            return;
        }

        if now >= self.session.next_status {
            self.session.next_status = now + self.config.status_interval();
            self.send_status().await;
        }

        tokio::time::sleep(self.config.tick_interval()).await;
    }

    /// Register the device with the control server
    async fn register(&mut self) -> Result<()> {
        let registration = Registration {
            device_id: self.identity.device_id.clone(),
            device_name: self.identity.device_name.clone(),
            current_ip: self.session.current_ip.clone(),
            platform: self.identity.platform.as_str().to_string(),
        };

        self.control.register(&registration).await?;
        info!(device_name = %registration.device_name, "Registered with control server");
        Ok(())
    }

    /// Send a heartbeat; failures are a best-effort liveness signal and
    /// are swallowed
    async fn send_status(&mut self) {
        self.refresh_current_ip().await;

        let status = StatusUpdate::online(&self.identity.device_id, &self.session.current_ip);
        if let Err(e) = self.control.send_status(&status).await {
            debug!(error = %e, "Heartbeat failed, ignoring");
        }
    }

    /// Fetch pending commands and dispatch them serially
    ///
    /// Fetch failures are swallowed (an unreachable server is normal);
    /// dispatch errors propagate so the tick applies its backoff.
    async fn check_commands(&mut self) -> Result<()> {
        let commands = match self.control.fetch_commands(&self.identity.device_id).await {
            Ok(commands) => commands,
            Err(e) => {
                debug!(error = %e, "Command fetch failed, ignoring");
                return Ok(());
            }
        };

        for command in commands {
            self.execute_command(command).await?;
            if !self.session.running {
                break;
            }
        }

        Ok(())
    }

    /// Dispatch a single command
    async fn execute_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::ChangeIp => {
                info!("Server command: rotate IP");
                let result = self.rotation.rotate().await;
                if result.success {
                    self.session.current_ip = result.new_ip.clone();
                }

                let report = IpChangeReport {
                    device_id: self.identity.device_id.clone(),
                    old_ip: result.old_ip.clone(),
                    new_ip: result.new_ip.clone(),
                    change_duration: result.duration_seconds(),
                    success: result.success,
                    timestamp: chrono::Utc::now().to_rfc3339(),
                };
                self.control.report_ip_change(&report).await?;
            }
            Command::Test => {
                info!("Server command: test");
                self.send_status().await;
            }
            Command::Stop => {
                info!("Server command: stop");
                self.session.running = false;
            }
            Command::Unknown(name) => {
                warn!(command = %name, "Ignoring unknown server command");
            }
        }

        Ok(())
    }

    /// Best-effort refresh of the session's current IP
    async fn refresh_current_ip(&mut self) {
        match self.resolver.resolve().await {
            Ok(ip) => self.session.current_ip = ip.to_string(),
            Err(e) => {
                debug!(error = %e, "Current IP unresolved");
            }
        }
    }
}
