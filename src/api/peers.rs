use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{event, instrument, Level};

use crate::directory::DirectoryStore;
use crate::error::{Result, WhisperError};

#[derive(Debug, Deserialize)]
pub struct HelloParams {
    pub addr: Option<String>,
}

/// Register a node's address
#[instrument(skip(store), level = "debug")]
pub async fn hello(
    State(store): State<DirectoryStore>,
    Query(params): Query<HelloParams>,
) -> Result<StatusCode> {
    let addr = params
        .addr
        .map(|addr| addr.trim().to_string())
        .filter(|addr| !addr.is_empty())
        .ok_or_else(|| WhisperError::Api("missing addr parameter".to_string()))?;

    store.register(addr.clone()).map_err(|err| {
        event!(
            Level::ERROR,
            message = "Failed registering peer",
            addr = addr.as_str(),
            err = format!("{:?}", err)
        );
        err
    })?;
    Ok(StatusCode::OK)
}

/// Snapshot of registered addresses as a JSON array
#[instrument(skip(store), level = "debug")]
pub async fn peers(State(store): State<DirectoryStore>) -> Result<Json<Vec<String>>> {
    store.list().map(Json)
}
