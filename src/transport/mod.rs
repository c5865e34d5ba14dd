//! TCP plumbing shared by nodes and the directory prober
//!
//! Provides the message wire codec, outbound dialing with a timeout, and the
//! peer listener bound to this host's non-loopback address.

pub mod codec;

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Result, WhisperError};
pub use codec::{MessageDecoder, MessageEncoder};

/// Open a TCP connection to `addr`, giving up after `connect_timeout`
pub async fn dial(addr: &str, connect_timeout: Duration) -> Result<TcpStream> {
    match timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => {
            debug!("Created new TCP connection to {}", addr);
            Ok(stream)
        }
        Ok(Err(e)) => Err(WhisperError::Transport(format!(
            "Failed to connect to {}: {}",
            addr, e
        ))),
        Err(_) => Err(WhisperError::Transport(format!(
            "Connection timeout to {}",
            addr
        ))),
    }
}

/// Bind the peer listener.
///
/// Without an explicit address the first non-loopback IPv4 address of this
/// host is used, so the bound address is something other peers can reach.
pub async fn bind_listener(address: Option<IpAddr>, port: u16) -> Result<TcpListener> {
    let ip = match address {
        Some(ip) => ip,
        None => local_ipv4()?,
    };
    let listener = TcpListener::bind(SocketAddr::new(ip, port))
        .await
        .map_err(|e| WhisperError::Transport(format!("Socket creation failed: {}", e)))?;
    Ok(listener)
}

/// First non-loopback IPv4 address of this host's interfaces.
pub fn local_ipv4() -> Result<IpAddr> {
    let interfaces = if_addrs::get_if_addrs()
        .map_err(|e| crate::config_error!("failed to list network interfaces: {}", e))?;
    first_non_loopback_ipv4(interfaces.iter().map(|iface| iface.ip())).ok_or_else(|| {
        crate::config_error!(
            "could not find active non-loopback address: are you connected to the network?"
        )
    })
}

/// Pick the first address that is IPv4 and neither loopback nor unspecified
fn first_non_loopback_ipv4<I>(addrs: I) -> Option<IpAddr>
where
    I: IntoIterator<Item = IpAddr>,
{
    addrs
        .into_iter()
        .find(|ip| ip.is_ipv4() && !ip.is_loopback() && !ip.is_unspecified())
}
