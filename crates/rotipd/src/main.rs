// # rotipd - IP-rotation agent daemon
//
// The rotipd daemon is a thin integration layer. It is responsible for:
// 1. Loading the JSON configuration file (creating a default on first run)
// 2. Initializing tracing
// 3. Wiring the resolver, platform control, history store and control
//    plane into the agent command loop
// 4. Running the loop under OS signal handling
//
// All agent behavior lives in rotip-core; nothing here retries, schedules
// or interprets commands.
//
// ## Configuration
//
// - `ROTIP_CONFIG`: path to the JSON config file (default
//   `config/config.json`)
// - `ROTIP_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// The config file carries `server_url`, `device_name`, `history_path`,
// `auto_connect`, `last_connected` and the optional `agent`/`rotation`
// sections; see rotip-core's `AgentConfig`.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use rotip_core::identity::{DeviceIdentity, default_device_name};
use rotip_core::{AgentCommandLoop, AgentConfig, FileHistoryStore, IpRotationController};
use rotip_control_http::HttpControlPlane;
use rotip_ip_http::HttpIpResolver;
use rotip_platform_su::SuPlatformControl;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Default location of the config file, relative to the working directory
const DEFAULT_CONFIG_PATH: &str = "config/config.json";

/// Placeholder server URL written into a freshly created config file
const PLACEHOLDER_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum AgentExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<AgentExitCode> for ExitCode {
    fn from(code: AgentExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Initialize tracing first so config problems are visible
    let log_level = match env::var("ROTIP_LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => {
            eprintln!("Unknown ROTIP_LOG_LEVEL '{}', valid: trace, debug, info, warn, error", other);
            return AgentExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AgentExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AgentExitCode::RuntimeError.into();
        }
    };

    let config_path = PathBuf::from(
        env::var("ROTIP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
    );

    let result = rt.block_on(async {
        let config = match load_or_init_config(&config_path).await {
            Ok(config) => config,
            Err(e) => {
                error!("Configuration error: {}", e);
                return AgentExitCode::ConfigError;
            }
        };

        if let Err(e) = config.validate() {
            error!("Configuration validation error: {}", e);
            return AgentExitCode::ConfigError;
        }

        match run_agent(config, &config_path).await {
            Ok(()) => AgentExitCode::CleanShutdown,
            Err(e) => {
                error!("Agent error: {}", e);
                AgentExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Load the config file, writing a default one on first run
async fn load_or_init_config(path: &PathBuf) -> Result<AgentConfig> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(AgentConfig::load(path).await?);
    }

    let config = AgentConfig::new(PLACEHOLDER_SERVER_URL, default_device_name());
    config.save(path).await?;
    info!(path = %path.display(), "Created default config file; set server_url before connecting");
    Ok(config)
}

/// Wire the components and run the agent loop until shutdown
async fn run_agent(mut config: AgentConfig, config_path: &PathBuf) -> Result<()> {
    if !config.auto_connect {
        info!("auto_connect is disabled in the config; rotipd connects regardless in daemon mode");
    }

    // Record the session start; informational only, a failure here must
    // not stop the agent
    config.last_connected = Some(chrono::Utc::now());
    if let Err(e) = config.save(config_path).await {
        warn!(error = %e, "Could not update last_connected in config file");
    }

    let identity = DeviceIdentity::identify(config.device_name.clone()).await;
    info!(
        device_id = %identity.device_id,
        platform = %identity.platform,
        server = %config.server_url_trimmed(),
        "Starting rotip agent"
    );

    let resolver = Arc::new(HttpIpResolver::new());
    let platform = Arc::new(SuPlatformControl::new());
    let history = Arc::new(FileHistoryStore::new(&config.history_path));
    let control = Arc::new(HttpControlPlane::new(config.server_url_trimmed()));

    let rotation = IpRotationController::new(
        resolver.clone(),
        platform,
        history,
        config.rotation.clone(),
    );

    let mut agent = AgentCommandLoop::new(
        identity,
        control,
        resolver,
        rotation,
        config.agent.clone(),
    );

    // Route SIGINT/SIGTERM into the loop's cooperative shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let signal_name = wait_for_shutdown().await;
        info!(signal = signal_name, "Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    agent.run_with_shutdown(Some(shutdown_rx)).await?;
    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> &'static str {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "Failed to install SIGTERM handler, falling back to ctrl_c");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = tokio::signal::ctrl_c() => "SIGINT",
    }
}

/// Wait for CTRL-C (non-Unix fallback)
#[cfg(not(unix))]
async fn wait_for_shutdown() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}
