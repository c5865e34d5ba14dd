//! Flood engine
//!
//! Applies duplicate suppression and the TTL policy to every message a node
//! sees, renders fresh messages locally and fans them out to every registered
//! peer. Each peer gets an independent enqueue attempt bounded by the send
//! timeout, so one stalled peer never holds up the others.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, trace};

use super::context::NodeContext;
use crate::error::Result;
use crate::message::Message;

/// What the engine did with an incoming message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FloodOutcome {
    /// Already processed once; dropped
    Duplicate,
    /// Rendered locally, hop budget spent
    Delivered,
    /// Rendered locally and re-broadcast with the decremented `ttl`
    Forwarded { ttl: u32, fanout: usize },
}

#[derive(Debug, Default)]
pub struct FloodStats {
    pub received: AtomicU64,
    pub duplicates: AtomicU64,
    pub delivered: AtomicU64,
    pub forwarded: AtomicU64,
    pub originated: AtomicU64,
    pub send_timeouts: AtomicU64,
    pub send_failures: AtomicU64,
}

/// Plain copy of [`FloodStats`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrozenFloodStats {
    pub received: u64,
    pub duplicates: u64,
    pub delivered: u64,
    pub forwarded: u64,
    pub originated: u64,
    pub send_timeouts: u64,
    pub send_failures: u64,
}

impl FloodStats {
    pub fn freeze(&self) -> FrozenFloodStats {
        FrozenFloodStats {
            received: self.received.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            originated: self.originated.load(Ordering::Relaxed),
            send_timeouts: self.send_timeouts.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FloodEngine {
    ctx: NodeContext,
    deliveries: mpsc::UnboundedSender<Message>,
    stats: Arc<FloodStats>,
}

impl FloodEngine {
    /// Rendered messages are pushed onto `deliveries`
    pub fn new(ctx: NodeContext, deliveries: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            ctx,
            deliveries,
            stats: Arc::new(FloodStats::default()),
        }
    }

    pub fn context(&self) -> &NodeContext {
        &self.ctx
    }

    pub fn stats(&self) -> FrozenFloodStats {
        self.stats.freeze()
    }

    /// Process a message decoded from a peer
    pub fn handle_incoming(&self, message: Message) -> Result<FloodOutcome> {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        if !self.ctx.seen.mark_seen(&message.id)? {
            self.stats.duplicates.fetch_add(1, Ordering::Relaxed);
            trace!("Dropping duplicate message {}", message.id);
            return Ok(FloodOutcome::Duplicate);
        }

        match message.forwarded() {
            None => {
                self.render(message);
                Ok(FloodOutcome::Delivered)
            }
            Some(next) => {
                let fanout = self.broadcast(&next)?;
                self.stats.forwarded.fetch_add(1, Ordering::Relaxed);
                let ttl = next.ttl;
                self.render(next);
                Ok(FloodOutcome::Forwarded { ttl, fanout })
            }
        }
    }

    /// Originate a message from local input.
    ///
    /// The fresh ID is marked seen before broadcasting so echoes from peers
    /// are dropped. The message goes out with the configured default TTL.
    pub fn originate(&self, body: impl Into<String>) -> Result<(Message, usize)> {
        let message = Message::originate(body, self.ctx.settings.default_ttl);
        self.ctx.seen.mark_seen(&message.id)?;
        self.stats.originated.fetch_add(1, Ordering::Relaxed);
        let fanout = self.broadcast(&message)?;
        debug!("Originated message {} to {} peers", message.id, fanout);
        Ok((message, fanout))
    }

    /// Offer `message` to every registered peer without waiting on any of them.
    ///
    /// Returns the number of peers an enqueue attempt was started for. A peer
    /// whose queue does not accept within the send timeout silently misses
    /// the message.
    pub fn broadcast(&self, message: &Message) -> Result<usize> {
        let senders = self.ctx.registry.senders()?;
        let send_timeout = self.ctx.settings.send_timeout();
        for (peer, sender) in senders.iter().cloned() {
            let message = message.clone();
            let stats = self.stats.clone();
            tokio::spawn(async move {
                match timeout(send_timeout, sender.send(message)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => {
                        stats.send_failures.fetch_add(1, Ordering::Relaxed);
                        debug!("Link to {} closed before send", peer);
                    }
                    Err(_) => {
                        stats.send_timeouts.fetch_add(1, Ordering::Relaxed);
                        debug!("Send to {} timed out, dropping message", peer);
                    }
                }
            });
        }
        Ok(senders.len())
    }

    fn render(&self, message: Message) {
        self.stats.delivered.fetch_add(1, Ordering::Relaxed);
        if self.deliveries.send(message).is_err() {
            trace!("No renderer attached, message discarded");
        }
    }
}
