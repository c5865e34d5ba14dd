//! Discovery poller
//!
//! Polls the directory on a fixed interval, re-registers this node if the
//! directory has dropped it, and opens links to peers it is not yet
//! connected to. Failed connects are simply tried again on a later tick.
use std::collections::HashSet;

use tokio::time;
use tracing::{debug, info, warn};

use super::context::NodeContext;
use super::link::spawn_link;
use crate::directory::DirectoryClient;
use crate::error::Result;

pub struct DiscoveryPoller {
    client: DirectoryClient,
    self_addr: String,
    ctx: NodeContext,
}

impl DiscoveryPoller {
    pub fn new(client: DirectoryClient, self_addr: String, ctx: NodeContext) -> Self {
        Self {
            client,
            self_addr,
            ctx,
        }
    }

    /// One poll round. Returns the addresses a link was started for.
    pub async fn poll_once(&self) -> Result<Vec<String>> {
        let peers = self.client.list_peers().await?;

        if !peers.iter().any(|addr| addr == &self.self_addr) {
            match self.client.register(&self.self_addr).await {
                Ok(()) => info!("Registered {} with directory", self.self_addr),
                Err(e) => warn!("Re-registration failed: {}", e),
            }
        }

        let mut dialing = HashSet::new();
        for addr in peers {
            if addr == self.self_addr || dialing.contains(&addr) {
                continue;
            }
            if self.ctx.registry.contains(&addr)? {
                continue;
            }
            spawn_link(self.ctx.clone(), addr.clone());
            dialing.insert(addr);
        }
        Ok(dialing.into_iter().collect())
    }

    pub async fn run(self) {
        let interval = self.ctx.settings.poll_interval();
        info!(
            "Discovery poller starting with {}ms interval",
            interval.as_millis()
        );
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.poll_once().await {
                Ok(started) if !started.is_empty() => {
                    debug!("Dialing {} new peers: {:?}", started.len(), started)
                }
                Ok(_) => {}
                Err(e) => warn!("Directory poll failed: {}", e),
            }
        }
    }
}
