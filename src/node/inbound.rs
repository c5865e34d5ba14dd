//! Inbound acceptor: one decode loop per accepted peer connection
use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::flood::FloodEngine;
use crate::error::Result;
use crate::transport::MessageDecoder;

/// Accept peer connections forever, spawning a decode loop for each.
///
/// Decode loops belong to this task: aborting the acceptor aborts them too.
pub async fn accept_loop(listener: TcpListener, engine: FloodEngine) {
    let mut connections = JoinSet::new();
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            Some(_) = connections.join_next(), if !connections.is_empty() => continue,
        };
        let (stream, peer_addr) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                warn!("TCP accept failed: {}", e);
                // avoid spinning when out of file descriptors
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        let engine = engine.clone();
        connections.spawn(async move {
            let peer = peer_addr.to_string();
            if let Err(e) = read_messages(stream, &peer, &engine).await {
                warn!("Dropping connection from {}: {}", peer, e);
            }
        });
    }
}

/// Decode messages from one peer until the stream ends or breaks.
///
/// A clean end of stream returns `Ok`; any decode error ends the loop and is
/// returned, leaving the rest of the node untouched.
pub async fn read_messages<R>(reader: R, peer: &str, engine: &FloodEngine) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    info!("- accepted connection from {}", peer);
    let mut decoder = MessageDecoder::new(reader);
    while let Some(message) = decoder.next_message().await? {
        let id = message.id.clone();
        let outcome = engine.handle_incoming(message)?;
        debug!("Message {} from {}: {:?}", id, peer, outcome);
    }
    debug!("Connection from {} closed", peer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::message::Message;
    use crate::node::context::NodeContext;
    use crate::settings::NodeSettings;

    fn engine() -> (FloodEngine, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (FloodEngine::new(NodeContext::new(NodeSettings::default()), tx), rx)
    }

    #[tokio::test]
    async fn test_reads_until_clean_eof() {
        let (engine, mut deliveries) = engine();
        let input = b"{\"ID\":\"a\",\"Body\":\"one\",\"TTL\":0}\n{\"ID\":\"b\",\"Body\":\"two\",\"TTL\":0}\n";

        read_messages(&input[..], "test", &engine).await.unwrap();

        assert_eq!(deliveries.recv().await.unwrap().body, "one");
        assert_eq!(deliveries.recv().await.unwrap().body, "two");
    }

    #[tokio::test]
    async fn test_decode_error_ends_only_this_loop() {
        let (engine, mut deliveries) = engine();
        let input = b"{\"ID\":\"a\",\"Body\":\"one\",\"TTL\":0}\n{broken\n{\"ID\":\"b\",\"Body\":\"two\",\"TTL\":0}\n";

        assert!(read_messages(&input[..], "test", &engine).await.is_err());
        assert_eq!(deliveries.recv().await.unwrap().body, "one");
        assert!(deliveries.try_recv().is_err());

        // the engine keeps working for other connections
        let other = b"{\"ID\":\"c\",\"Body\":\"three\",\"TTL\":0}\n";
        read_messages(&other[..], "other", &engine).await.unwrap();
        assert_eq!(deliveries.recv().await.unwrap().body, "three");
    }
}
