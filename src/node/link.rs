//! Outbound peer links
//!
//! A link owns one TCP connection and the receiving end of the queue
//! registered for its peer. It writes queued messages in order until a write
//! fails, the peer hangs up, or the queue is closed, then removes its own
//! registry entry.
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::context::NodeContext;
use super::registry::{ConnectionRegistry, LinkId};
use crate::error::Result;
use crate::message::Message;
use crate::transport::{self, MessageEncoder};

pub struct OutboundLink {
    registration: Registration,
    stream: TcpStream,
    queue: mpsc::Receiver<Message>,
}

/// Registry entry held by a link; dropping it removes the entry if this link
/// still owns it, whether or not the link was ever driven.
struct Registration {
    addr: String,
    link_id: LinkId,
    registry: ConnectionRegistry,
}

impl Drop for Registration {
    fn drop(&mut self) {
        match self.registry.remove_if_owner(&self.addr, self.link_id) {
            Ok(true) => {}
            Ok(false) => debug!("Link {} for {} already replaced", self.link_id, self.addr),
            Err(e) => error!("Failed removing link for {}: {}", self.addr, e),
        }
    }
}

impl OutboundLink {
    /// Dial `addr` and register a queue for it.
    ///
    /// Returns `Ok(None)` when the address already has a link, including when
    /// a concurrent connect registered first. Connect failures are returned
    /// to the caller and not retried here.
    pub async fn connect(ctx: &NodeContext, addr: &str) -> Result<Option<Self>> {
        if ctx.registry.contains(addr)? {
            return Ok(None);
        }

        let stream = transport::dial(addr, ctx.settings.connect_timeout()).await?;
        let (sender, queue) = mpsc::channel(ctx.settings.send_queue_depth);
        match ctx.registry.register(addr, sender)? {
            Some(link_id) => {
                info!("- connected to {}", addr);
                Ok(Some(Self {
                    registration: Registration {
                        addr: addr.to_string(),
                        link_id,
                        registry: ctx.registry.clone(),
                    },
                    stream,
                    queue,
                }))
            }
            None => {
                debug!("Link to {} already registered, closing duplicate", addr);
                Ok(None)
            }
        }
    }

    pub fn addr(&self) -> &str {
        &self.registration.addr
    }

    pub fn link_id(&self) -> LinkId {
        self.registration.link_id
    }

    /// Pump queued messages onto the connection until the link terminates
    pub async fn drive(self) -> Result<()> {
        let Self {
            registration,
            stream,
            mut queue,
        } = self;

        let (mut read_half, write_half) = stream.into_split();
        let mut encoder = MessageEncoder::new(write_half);
        let mut scratch = [0u8; 512];

        let result = loop {
            tokio::select! {
                next = queue.recv() => match next {
                    Some(message) => {
                        if let Err(e) = encoder.send(&message).await {
                            break Err(e);
                        }
                    }
                    // registry entry dropped: explicit close
                    None => break Ok(()),
                },
                // peers never write on this connection; any read result is a hangup
                read = read_half.read(&mut scratch) => match read {
                    Ok(0) => break Ok(()),
                    Ok(_) => continue,
                    Err(e) => break Err(e.into()),
                },
            }
        };

        info!("- disconnected from {}", registration.addr);
        drop(registration);
        result
    }

    /// Drive the link on its own task, logging how it ended
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let addr = self.addr().to_string();
            if let Err(e) = self.drive().await {
                warn!("Link to {} failed: {}", addr, e);
            }
        })
    }
}

/// Connect to `addr` and drive the link in the background
pub fn spawn_link(ctx: NodeContext, addr: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        match OutboundLink::connect(&ctx, &addr).await {
            Ok(Some(link)) => {
                if let Err(e) = link.drive().await {
                    warn!("Link to {} failed: {}", addr, e);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{}", e),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;
    use tokio::time::timeout;

    use super::*;
    use crate::settings::NodeSettings;
    use crate::transport::MessageDecoder;

    async fn wait_until<F: Fn() -> bool>(check: F) {
        timeout(Duration::from_secs(2), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_link_writes_in_enqueue_order() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let ctx = NodeContext::new(NodeSettings::default());

        let link = OutboundLink::connect(&ctx, &addr).await.unwrap().unwrap();
        let (peer_stream, _) = listener.accept().await.unwrap();
        link.spawn();

        let senders = ctx.registry.senders().unwrap();
        let (_, sender) = &senders[0];
        for i in 0..5 {
            sender
                .send(Message::new(format!("m{}", i), "body", 1))
                .await
                .unwrap();
        }

        let mut decoder = MessageDecoder::new(peer_stream);
        for i in 0..5 {
            let message = decoder.next_message().await.unwrap().unwrap();
            assert_eq!(message.id, format!("m{}", i));
        }
    }

    #[tokio::test]
    async fn test_connect_to_registered_address_is_noop() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let ctx = NodeContext::new(NodeSettings::default());

        let first = OutboundLink::connect(&ctx, &addr).await.unwrap();
        assert!(first.is_some());
        let second = OutboundLink::connect(&ctx, &addr).await.unwrap();
        assert!(second.is_none());
        assert_eq!(ctx.registry.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_undriven_link_releases_entry_on_drop() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let ctx = NodeContext::new(NodeSettings::default());

        let link = OutboundLink::connect(&ctx, &addr).await.unwrap().unwrap();
        assert!(ctx.registry.contains(&addr).unwrap());
        drop(link);
        assert!(!ctx.registry.contains(&addr).unwrap());

        // the address can be dialed again
        let again = OutboundLink::connect(&ctx, &addr).await.unwrap();
        assert!(again.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_connects_leave_one_entry() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let ctx = NodeContext::new(NodeSettings::default());

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let ctx = ctx.clone();
                let addr = addr.clone();
                tokio::spawn(async move { OutboundLink::connect(&ctx, &addr).await })
            })
            .collect();
        let mut links = Vec::new();
        for attempt in attempts {
            if let Some(link) = attempt.await.unwrap().unwrap() {
                links.push(link);
            }
        }

        assert_eq!(links.len(), 1);
        assert_eq!(ctx.registry.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let closed = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap().to_string()
        };
        let ctx = NodeContext::new(NodeSettings::default());

        assert!(OutboundLink::connect(&ctx, &closed).await.is_err());
        assert!(ctx.registry.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_peer_hangup_removes_entry() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let ctx = NodeContext::new(NodeSettings::default());

        let link = OutboundLink::connect(&ctx, &addr).await.unwrap().unwrap();
        let (peer_stream, _) = listener.accept().await.unwrap();
        let driver = link.spawn();
        assert!(ctx.registry.contains(&addr).unwrap());

        drop(peer_stream);
        timeout(Duration::from_secs(2), driver).await.unwrap().unwrap();
        assert!(!ctx.registry.contains(&addr).unwrap());
    }

    #[tokio::test]
    async fn test_finished_link_keeps_replacement() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let ctx = NodeContext::new(NodeSettings::default());

        let old = OutboundLink::connect(&ctx, &addr).await.unwrap().unwrap();
        let _old_peer = listener.accept().await.unwrap();
        let old_id = old.link_id();
        let old_driver = old.spawn();

        // close the old queue and immediately reconnect under the same address
        ctx.registry.disconnect(&addr).unwrap();
        let new = OutboundLink::connect(&ctx, &addr).await.unwrap().unwrap();
        let _new_peer = listener.accept().await.unwrap();
        assert_ne!(new.link_id(), old_id);
        let _new_driver = new.spawn();

        timeout(Duration::from_secs(2), old_driver).await.unwrap().unwrap();
        wait_until(|| ctx.registry.contains(&addr).unwrap()).await;
        assert_eq!(ctx.registry.len().unwrap(), 1);
    }
}
