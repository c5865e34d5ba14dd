use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use whispernet::cli;
use whispernet::directory::DirectoryClient;
use whispernet::node::Node;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries rendered messages
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "whispernet=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse args and env vars
    let settings = cli::NodeCli::parse().into_settings()?;
    let client = DirectoryClient::new(&settings.directory, settings.directory_timeout())?;

    let (node, mut deliveries) = Node::start(settings).await?;
    let self_addr = node.peer_address();
    info!("Starting whispernet node on {}", self_addr);

    // Discovery re-registers on its next tick if this fails
    if let Err(e) = client.register(&self_addr).await {
        warn!("Initial registration failed: {}", e);
    }
    tokio::spawn(node.discovery(client).run());

    tokio::spawn(async move {
        while let Some(message) = deliveries.recv().await {
            println!("> {}", message.body);
        }
    });

    let sent = node.read_input(BufReader::new(tokio::io::stdin())).await?;
    info!("Input closed after {} messages, shutting down", sent);
    Ok(())
}
