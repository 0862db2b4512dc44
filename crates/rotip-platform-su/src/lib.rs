// # Rooted-shell platform control
//
// This crate implements the `PlatformControl` seam for rooted Android
// devices (typically running under Termux). Airplane mode and mobile data
// are driven through `su -c` shell commands:
//
// - airplane mode: `settings put global airplane_mode_on <0|1>` followed
//   by the `android.intent.action.AIRPLANE_MODE` broadcast so the radio
//   actually reacts to the setting change
// - mobile data: `svc data disable` / `svc data enable` with a short
//   settle pause between them
//
// Every operation is single-shot and reports a plain pass/fail outcome;
// the rotation controller decides what a failure means (it continues, by
// policy: the radio may cycle even when the command errors out).

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use rotip_core::traits::PlatformControl;
use rotip_core::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Pause between data-disable and data-enable
const DATA_SETTLE: Duration = Duration::from_secs(1);

/// Build the two shell commands for an airplane-mode transition
fn airplane_mode_commands(enabled: bool) -> [String; 2] {
    let flag = if enabled { "1" } else { "0" };
    let state = if enabled { "true" } else { "false" };
    [
        format!("settings put global airplane_mode_on {}", flag),
        format!(
            "am broadcast -a android.intent.action.AIRPLANE_MODE --ez state {}",
            state
        ),
    ]
}

/// PlatformControl implementation backed by a rooted shell
#[derive(Debug, Clone, Default)]
pub struct SuPlatformControl;

impl SuPlatformControl {
    /// Create a new rooted-shell platform control
    pub fn new() -> Self {
        Self
    }

    /// Run one command line under `su -c`
    async fn run_su(&self, command_line: &str) -> Result<()> {
        debug!(command = command_line, "Running privileged command");

        let status = Command::new("su")
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| Error::platform(format!("Failed to spawn su: {}", e)))?;

        if !status.success() {
            return Err(Error::platform(format!(
                "`su -c {}` exited with {}",
                command_line, status
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl PlatformControl for SuPlatformControl {
    async fn set_airplane_mode(&self, enabled: bool) -> Result<()> {
        for command_line in airplane_mode_commands(enabled) {
            self.run_su(&command_line).await?;
        }
        Ok(())
    }

    async fn reset_mobile_data(&self) -> Result<()> {
        self.run_su("svc data disable").await?;
        tokio::time::sleep(DATA_SETTLE).await;
        self.run_su("svc data enable").await?;
        tokio::time::sleep(DATA_SETTLE).await;
        Ok(())
    }
}
