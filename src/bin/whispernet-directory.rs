use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use whispernet::api;
use whispernet::cli;
use whispernet::directory::{DirectoryStore, LivenessProber, TcpProbe};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "whispernet=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse args and env vars
    let settings = cli::DirectoryCli::parse().into_settings()?;
    let store = DirectoryStore::new();

    if settings.probe_enabled {
        let prober = LivenessProber::new(
            store.clone(),
            Arc::new(TcpProbe::new(settings.probe_timeout())),
            settings.probe_interval(),
        );
        tokio::spawn(prober.run());
    }

    // Start server
    let socket_address = settings.socket_address();
    info!("Starting whispernet directory on {}", socket_address);
    axum::Server::try_bind(&socket_address)?
        .serve(api::api(store).into_make_service())
        .await?;

    Ok(())
}
