//! Core traits for the rotip agent
//!
//! This module defines the abstract interfaces behind which all external
//! capabilities sit:
//!
//! - [`PublicIpResolver`]: query external services for the current public IP
//! - [`PlatformControl`]: privileged radio operations (airplane mode, data)
//! - [`ControlPlane`]: the control-server HTTP API
//! - [`IpHistoryStore`]: durable, deduplicating record of observed IPs

pub mod control_plane;
pub mod history_store;
pub mod ip_resolver;
pub mod platform_control;

pub use control_plane::{Command, ControlPlane, IpChangeReport, Registration, StatusUpdate};
pub use history_store::IpHistoryStore;
pub use ip_resolver::PublicIpResolver;
pub use platform_control::PlatformControl;
