//! Platform control trait
//!
//! Privileged, OS-specific radio operations are consumed through this seam
//! so the rotation controller stays portable. Implementations invoke
//! whatever the platform offers (rooted shell commands on Android/Termux)
//! and report a plain pass/fail outcome.

use async_trait::async_trait;

/// Trait for privileged platform operations
///
/// Both operations are fire-and-forget from the controller's point of
/// view: a failure is logged and the rotation sequence continues, because
/// the underlying radio may still cycle even when the command reports an
/// error. Implementations must not retry internally.
#[async_trait]
pub trait PlatformControl: Send + Sync {
    /// Enable or disable airplane mode
    async fn set_airplane_mode(&self, enabled: bool) -> Result<(), crate::Error>;

    /// Cycle the mobile-data connection off and back on
    async fn reset_mobile_data(&self) -> Result<(), crate::Error>;
}
