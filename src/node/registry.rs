//! Connection registry: one outbound queue per connected peer address
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, WhisperError};
use crate::message::Message;

/// Identity of one outbound link instance
pub type LinkId = u64;

#[derive(Clone, Debug)]
struct LinkEntry {
    link_id: LinkId,
    sender: mpsc::Sender<Message>,
}

/// Shared map from peer address to the queue feeding that peer's link.
///
/// At most one entry exists per address. Each entry carries the [`LinkId`] of
/// the driver that owns it, so a finished driver only removes its own entry.
#[derive(Clone, Debug, Default)]
pub struct ConnectionRegistry {
    links: Arc<RwLock<HashMap<String, LinkEntry>>>,
    next_link_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, addr: &str) -> Result<bool> {
        self.links
            .read()
            .map_err(|e| WhisperError::Concurrency(format!("RwLock read fail {}", e)))
            .map(|links| links.contains_key(addr))
    }

    /// Register `sender` for `addr` unless the address already has a link.
    ///
    /// Returns the new link's identity, or `None` when another link won.
    pub fn register(&self, addr: &str, sender: mpsc::Sender<Message>) -> Result<Option<LinkId>> {
        let mut links = self
            .links
            .write()
            .map_err(|e| WhisperError::Concurrency(format!("RwLock write fail {}", e)))?;
        if links.contains_key(addr) {
            return Ok(None);
        }
        let link_id = self.next_link_id.fetch_add(1, Ordering::Relaxed);
        links.insert(addr.to_string(), LinkEntry { link_id, sender });
        debug!("Registered link {} for {}", link_id, addr);
        Ok(Some(link_id))
    }

    /// Remove the entry for `addr` only if it still belongs to `link_id`
    pub fn remove_if_owner(&self, addr: &str, link_id: LinkId) -> Result<bool> {
        let mut links = self
            .links
            .write()
            .map_err(|e| WhisperError::Concurrency(format!("RwLock write fail {}", e)))?;
        match links.get(addr) {
            Some(entry) if entry.link_id == link_id => {
                links.remove(addr);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Drop the queue for `addr`; its driver finishes once the queue drains
    pub fn disconnect(&self, addr: &str) -> Result<bool> {
        self.links
            .write()
            .map_err(|e| WhisperError::Concurrency(format!("RwLock write fail {}", e)))
            .map(|mut links| links.remove(addr).is_some())
    }

    /// Drop every queue, returning how many links were closed
    pub fn disconnect_all(&self) -> Result<usize> {
        self.links
            .write()
            .map_err(|e| WhisperError::Concurrency(format!("RwLock write fail {}", e)))
            .map(|mut links| links.drain().count())
    }

    /// Point-in-time copy of every peer's queue
    pub fn senders(&self) -> Result<Vec<(String, mpsc::Sender<Message>)>> {
        self.links
            .read()
            .map_err(|e| WhisperError::Concurrency(format!("RwLock read fail {}", e)))
            .map(|links| {
                links
                    .iter()
                    .map(|(addr, entry)| (addr.clone(), entry.sender.clone()))
                    .collect()
            })
    }

    pub fn peers(&self) -> Result<Vec<String>> {
        self.links
            .read()
            .map_err(|e| WhisperError::Concurrency(format!("RwLock read fail {}", e)))
            .map(|links| links.keys().cloned().collect())
    }

    pub fn len(&self) -> Result<usize> {
        self.links
            .read()
            .map_err(|e| WhisperError::Concurrency(format!("RwLock read fail {}", e)))
            .map(|links| links.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }
}
