use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::{Result, WhisperError};

/// IDs of every message this node has processed.
///
/// Entries are never evicted: memory grows with the number of distinct
/// messages seen over the node's lifetime.
#[derive(Clone, Debug, Default)]
pub struct SeenMessages {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl SeenMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic test-and-set: `true` only for the first caller with this ID
    pub fn mark_seen(&self, id: &str) -> Result<bool> {
        let mut ids = self
            .ids
            .lock()
            .map_err(|e| WhisperError::Concurrency(format!("Mutex lock fail {}", e)))?;
        if ids.contains(id) {
            return Ok(false);
        }
        ids.insert(id.to_string());
        Ok(true)
    }

    pub fn contains(&self, id: &str) -> Result<bool> {
        self.ids
            .lock()
            .map_err(|e| WhisperError::Concurrency(format!("Mutex lock fail {}", e)))
            .map(|ids| ids.contains(id))
    }

    pub fn len(&self) -> Result<usize> {
        self.ids
            .lock()
            .map_err(|e| WhisperError::Concurrency(format!("Mutex lock fail {}", e)))
            .map(|ids| ids.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }
}
