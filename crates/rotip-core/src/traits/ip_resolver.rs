//! Public-IP resolver trait
//!
//! Defines the interface for discovering the device's carrier-assigned
//! public IPv4 address via external IP-echo services.

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public-IP resolver implementations
///
/// A resolver makes one best-effort pass over whatever sources it knows
/// about and reports the first syntactically valid IPv4 address. An `Err`
/// is a normal outcome ("currently unresolvable"), not an exceptional one:
/// the radio may be mid-cycle, the network may be down, or every echo
/// service may be unreachable. Retry timing is owned by the caller (the
/// rotation controller), never by the resolver.
#[async_trait]
pub trait PublicIpResolver: Send + Sync {
    /// Resolve the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: a validated dotted-quad address
    /// - `Err(Error)`: every source failed; callers treat this as
    ///   "unresolved" and degrade, they do not propagate it as fatal
    async fn resolve(&self) -> Result<Ipv4Addr, crate::Error>;
}
