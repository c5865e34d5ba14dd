//! Liveness prober
//!
//! Periodically dials every directory entry and drops the ones that refuse or
//! time out. Probes never exchange protocol data.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio::time;
use tracing::{debug, info, warn};

use super::store::DirectoryStore;
use crate::error::Result;
use crate::transport;

/// Connectivity check for a single address
#[async_trait]
pub trait Probe: Send + Sync {
    /// `true` when `addr` accepted a connection
    async fn is_alive(&self, addr: &str) -> bool;
}

/// Connect-and-close probe over TCP
#[derive(Clone, Debug)]
pub struct TcpProbe {
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn is_alive(&self, addr: &str) -> bool {
        match transport::dial(addr, self.connect_timeout).await {
            // the stream drops here, closing the probe link
            Ok(_stream) => true,
            Err(e) => {
                debug!("Probe failed: {}", e);
                false
            }
        }
    }
}

/// Result of one probe round
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub probed: usize,
    pub removed: Vec<String>,
}

pub struct LivenessProber {
    store: DirectoryStore,
    probe: Arc<dyn Probe>,
    interval: Duration,
}

impl LivenessProber {
    pub fn new(store: DirectoryStore, probe: Arc<dyn Probe>, interval: Duration) -> Self {
        Self {
            store,
            probe,
            interval,
        }
    }

    /// Probe every entry of the current snapshot concurrently and remove the
    /// ones that failed. Each failure removes one matching entry.
    pub async fn probe_once(&self) -> Result<ProbeReport> {
        let snapshot = self.store.list()?;
        let mut probes = JoinSet::new();
        for addr in snapshot.iter().cloned() {
            let probe = self.probe.clone();
            probes.spawn(async move {
                let alive = probe.is_alive(&addr).await;
                (addr, alive)
            });
        }

        let mut report = ProbeReport {
            probed: snapshot.len(),
            removed: Vec::new(),
        };
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((addr, false)) => {
                    if self.store.remove(&addr)? {
                        info!("Peer {} unreachable, removed from directory", addr);
                        report.removed.push(addr);
                    }
                }
                Ok((_, true)) => {}
                Err(e) => warn!("Probe task failed: {}", e),
            }
        }
        Ok(report)
    }

    /// Run probe rounds forever
    pub async fn run(self) {
        info!(
            "Liveness prober starting with {}ms interval",
            self.interval.as_millis()
        );
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.probe_once().await {
                Ok(report) if !report.removed.is_empty() => debug!(
                    "Probe round: {} probed, {} removed",
                    report.probed,
                    report.removed.len()
                ),
                Ok(_) => {}
                Err(e) => warn!("Probe round failed: {}", e),
            }
        }
    }
}
