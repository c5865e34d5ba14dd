//! Flood node
//!
//! A node accepts inbound peer connections, keeps one outbound link per
//! discovered peer, and floods every fresh message to all of its links.
use std::net::SocketAddr;

use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub mod context;
pub mod discovery;
pub mod flood;
pub mod inbound;
pub mod input;
pub mod link;
pub mod registry;
pub mod seen;

use crate::directory::DirectoryClient;
use crate::error::Result;
use crate::message::Message;
use crate::settings::NodeSettings;
use crate::transport;
pub use context::NodeContext;
pub use discovery::DiscoveryPoller;
pub use flood::{FloodEngine, FloodOutcome, FrozenFloodStats};
pub use link::OutboundLink;
pub use registry::{ConnectionRegistry, LinkId};
pub use seen::SeenMessages;

/// Messages this node has rendered, in processing order
pub type Deliveries = mpsc::UnboundedReceiver<Message>;

#[derive(Debug)]
pub struct Node {
    engine: FloodEngine,
    local_addr: SocketAddr,
    acceptor: JoinHandle<()>,
}

impl Node {
    /// Bind the peer listener and start accepting connections.
    ///
    /// Failing to bind is fatal for the node and returned as an error.
    pub async fn start(settings: NodeSettings) -> Result<(Self, Deliveries)> {
        let listener = transport::bind_listener(settings.listen_address, settings.listen_port).await?;
        let local_addr = listener.local_addr()?;

        let (deliveries_tx, deliveries_rx) = mpsc::unbounded_channel();
        let engine = FloodEngine::new(NodeContext::new(settings), deliveries_tx);
        let acceptor = tokio::spawn(inbound::accept_loop(listener, engine.clone()));
        info!("Accepting peer connections on {}", local_addr);

        Ok((
            Self {
                engine,
                local_addr,
                acceptor,
            },
            deliveries_rx,
        ))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The address other peers reach this node at
    pub fn peer_address(&self) -> String {
        self.local_addr.to_string()
    }

    pub fn context(&self) -> &NodeContext {
        self.engine.context()
    }

    pub fn engine(&self) -> &FloodEngine {
        &self.engine
    }

    /// Open a link to `addr` and drive it in the background.
    ///
    /// `Ok(false)` means a link to that address already exists.
    pub async fn connect(&self, addr: &str) -> Result<bool> {
        match OutboundLink::connect(self.context(), addr).await? {
            Some(link) => {
                link.spawn();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Broadcast `body` as a new message originating here
    pub fn send(&self, body: impl Into<String>) -> Result<Message> {
        self.engine.originate(body).map(|(message, _)| message)
    }

    pub fn discovery(&self, client: DirectoryClient) -> DiscoveryPoller {
        DiscoveryPoller::new(client, self.peer_address(), self.context().clone())
    }

    /// Originate one message per line of `reader` until it ends
    pub async fn read_input<R>(&self, reader: R) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        input::read_input(reader, &self.engine).await
    }
}

/// Dropping a node stops its acceptor with every inbound decode loop and
/// closes all outbound queues, which ends their link drivers. A discovery
/// poller obtained from [`Node::discovery`] is owned by the caller.
impl Drop for Node {
    fn drop(&mut self) {
        self.acceptor.abort();
        match self.context().registry.disconnect_all() {
            Ok(closed) => debug!("Closed {} outbound links", closed),
            Err(e) => warn!("Failed closing outbound links: {}", e),
        }
    }
}
