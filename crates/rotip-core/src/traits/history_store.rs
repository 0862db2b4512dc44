//! IP history store trait
//!
//! The history store is an append-only, deduplicating record of every
//! distinct public IP the agent has ever observed. It backs the "new IP"
//! statistics reported after a rotation and must survive process restarts.
//!
//! ## Invariants
//!
//! - No duplicate entries
//! - Insertion order equals first-observed order
//! - Append is the only mutation; entries are never removed

use async_trait::async_trait;

/// Trait for history store implementations
///
/// Membership checks must reflect durable state at call time, not a cache
/// populated at startup: the agent is restarted often and the file may
/// outlive many processes. The agent is single-instance, so no external
/// locking is required; concurrent access from multiple agents against the
/// same store is unsupported.
#[async_trait]
pub trait IpHistoryStore: Send + Sync {
    /// Record an observed IP
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: the IP was new and has been appended
    /// - `Ok(false)`: the IP was already recorded; the store is unchanged
    /// - `Err(Error)`: storage error
    async fn record(&self, ip: &str) -> Result<bool, crate::Error>;

    /// Total number of distinct IPs recorded
    async fn count(&self) -> Result<usize, crate::Error>;

    /// All recorded IPs in first-observed order
    async fn list(&self) -> Result<Vec<String>, crate::Error>;
}
