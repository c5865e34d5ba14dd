//! whispernet application settings
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const STANDARD_PORT_DIRECTORY: u16 = 8000;
pub const DEFAULT_PORT_DIRECTORY: &str = "8000";
// Nodes listen on an ephemeral port unless told otherwise
pub const DEFAULT_PORT_NODE: &str = "0";

pub const DEFAULT_POLL_INTERVAL_MS: &str = "5000";
pub const DEFAULT_PROBE_INTERVAL_MS: &str = "5000";
pub const DEFAULT_PROBE_TIMEOUT_MS: &str = "2000";
pub const DEFAULT_SEND_TIMEOUT_MS: &str = "1000";
pub const DEFAULT_CONNECT_TIMEOUT_MS: &str = "2000";
pub const DEFAULT_DIRECTORY_TIMEOUT_MS: &str = "5000";
pub const DEFAULT_TTL: u32 = 5;
pub const DEFAULT_TTL_STR: &str = "5";
pub const DEFAULT_SEND_QUEUE_DEPTH: &str = "16";

/// Largest single wire frame (one encoded message) a node will accept
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Settings for a flood node
#[derive(Clone, Debug)]
pub struct NodeSettings {
    // Address of the directory service (host:port)
    pub directory: String,

    // Address to bind the peer listener to; discovered when absent
    pub listen_address: Option<IpAddr>,

    // Peer listener port (0 = ephemeral)
    pub listen_port: u16,

    // Directory poll interval
    pub poll_interval_ms: u64,

    // How long a broadcast waits for a peer's queue to accept a message
    pub send_timeout_ms: u64,

    // Outbound dial timeout
    pub connect_timeout_ms: u64,

    // HTTP timeout for directory requests
    pub directory_timeout_ms: u64,

    // TTL given to locally originated messages
    pub default_ttl: u32,

    // Capacity of each outbound link queue
    pub send_queue_depth: usize,
}

impl NodeSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn directory_timeout(&self) -> Duration {
        Duration::from_millis(self.directory_timeout_ms)
    }
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            directory: String::new(),
            listen_address: None,
            listen_port: 0,
            poll_interval_ms: 5000,
            send_timeout_ms: 1000,
            connect_timeout_ms: 2000,
            directory_timeout_ms: 5000,
            default_ttl: DEFAULT_TTL,
            send_queue_depth: 16,
        }
    }
}

/// Settings for the directory service
#[derive(Clone, Debug)]
pub struct DirectorySettings {
    // HTTP listen address
    pub listen_address: IpAddr,

    // HTTP listen port
    pub listen_port: u16,

    // Whether the liveness prober runs at all
    pub probe_enabled: bool,

    // Liveness probe interval
    pub probe_interval_ms: u64,

    // Connect timeout for a single probe
    pub probe_timeout_ms: u64,
}

impl DirectorySettings {
    pub fn socket_address(&self) -> SocketAddr {
        SocketAddr::from((self.listen_address, self.listen_port))
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            listen_address: IpAddr::from([0, 0, 0, 0]),
            listen_port: STANDARD_PORT_DIRECTORY,
            probe_enabled: true,
            probe_interval_ms: 5000,
            probe_timeout_ms: 2000,
        }
    }
}
