// # rotip-core
//
// Core library for the rotip IP-rotation agent.
//
// ## Architecture Overview
//
// - **PublicIpResolver**: trait for querying external IP-echo services
// - **PlatformControl**: trait for privileged radio operations
// - **ControlPlane**: trait for the control-server HTTP API
// - **IpHistoryStore**: trait for the durable dedup record of observed IPs
// - **IpRotationController**: radio cycle + bounded-retry confirmation
// - **AgentCommandLoop**: poll/execute/report cycle against the server
//
// ## Design Principles
//
// 1. **Seams at every capability**: network, radio and storage sit behind
//    traits so the controller and loop are testable with scripted mocks
// 2. **Failure degrades, never escalates**: transient failures become
//    `Err` values or `success: false` results, not loop termination
// 3. **Single cooperative loop**: one agent task, two interval deadlines,
//    no parallel command execution

pub mod agent;
pub mod config;
pub mod error;
pub mod history;
pub mod identity;
pub mod rotation;
pub mod traits;

// Re-export core types for convenience
pub use agent::AgentCommandLoop;
pub use config::{AgentConfig, LoopConfig, RotationConfig};
pub use error::{Error, Result};
pub use history::{FileHistoryStore, MemoryHistoryStore};
pub use identity::{DeviceIdentity, Platform};
pub use rotation::{IpChangeResult, IpRotationController};
pub use traits::{Command, ControlPlane, IpHistoryStore, PlatformControl, PublicIpResolver};
