use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::{Result, WhisperError};

/// In-memory list of registered peer addresses, in registration order.
///
/// Clones share the same list. Readers get a point-in-time copy and never
/// hold the lock while iterating.
#[derive(Clone, Debug, Default)]
pub struct DirectoryStore {
    peers: Arc<RwLock<Vec<String>>>,
}

impl DirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `addr` unconditionally; duplicates are kept
    pub fn register(&self, addr: impl Into<String>) -> Result<()> {
        let addr = addr.into();
        let mut peers = self
            .peers
            .write()
            .map_err(|e| WhisperError::Concurrency(format!("RwLock write fail {}", e)))?;
        debug!("Registered peer {}", addr);
        peers.push(addr);
        Ok(())
    }

    /// Snapshot of all stored addresses
    pub fn list(&self) -> Result<Vec<String>> {
        self.peers
            .read()
            .map_err(|e| WhisperError::Concurrency(format!("RwLock read fail {}", e)))
            .map(|peers| peers.clone())
    }

    /// Remove the first entry equal to `addr`, keeping the rest in order.
    ///
    /// Matches by value under the write lock, so entries appended since the
    /// caller's snapshot are never shifted into the removed slot.
    pub fn remove(&self, addr: &str) -> Result<bool> {
        let mut peers = self
            .peers
            .write()
            .map_err(|e| WhisperError::Concurrency(format!("RwLock write fail {}", e)))?;
        match peers.iter().position(|a| a == addr) {
            Some(pos) => {
                peers.remove(pos);
                debug!("Removed peer {}", addr);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn len(&self) -> Result<usize> {
        self.peers
            .read()
            .map_err(|e| WhisperError::Concurrency(format!("RwLock read fail {}", e)))
            .map(|peers| peers.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }
}
