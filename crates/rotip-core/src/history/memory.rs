//! In-memory IP history store
//!
//! Provides a history store that doesn't persist across restarts. Useful
//! for tests and for ephemeral runs where the dedup statistics don't need
//! to outlive the process; after a restart every IP counts as "new" again.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::IpHistoryStore;
use async_trait::async_trait;

/// In-memory history store implementation
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    // Vec rather than a set: first-observed order is part of the contract
    inner: Arc<RwLock<Vec<String>>>,
}

impl MemoryHistoryStore {
    /// Create a new empty memory history store
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl IpHistoryStore for MemoryHistoryStore {
    async fn record(&self, ip: &str) -> Result<bool, Error> {
        let mut guard = self.inner.write().await;
        if guard.iter().any(|existing| existing == ip) {
            return Ok(false);
        }
        guard.push(ip.to_string());
        Ok(true)
    }

    async fn count(&self) -> Result<usize, Error> {
        Ok(self.inner.read().await.len())
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        Ok(self.inner.read().await.clone())
    }
}
