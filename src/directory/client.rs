//! HTTP client nodes use to talk to the directory service
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};

use crate::api::paths;
use crate::error::{Result, WhisperError};

#[derive(Clone, Debug)]
pub struct DirectoryClient {
    base_url: String,
    http: Client,
}

impl DirectoryClient {
    /// Build a client for the directory at `directory` (`host:port`)
    pub fn new(directory: &str, request_timeout: Duration) -> Result<Self> {
        let directory = directory.trim();
        if directory.is_empty() {
            return Err(crate::config_error!(
                "a directory address is required (e.g. --directory 127.0.0.1:8000)"
            ));
        }
        let base_url = if directory.starts_with("http://") || directory.starts_with("https://") {
            directory.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", directory)
        };
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| crate::config_error!("Failed to build HTTP client: {}", e))?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Announce `addr` to the directory
    #[instrument(skip(self), level = "debug")]
    pub async fn register(&self, addr: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, paths::HELLO);
        let response = self
            .http
            .post(&url)
            .query(&[("addr", addr)])
            .send()
            .await
            .map_err(|e| crate::directory_error!("register {}: {}", addr, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(crate::directory_error!("register {}: {}", addr, status));
        }
        debug!("Registered {} with {}", addr, self.base_url);
        Ok(())
    }

    /// Current peer list held by the directory
    #[instrument(skip(self), level = "debug")]
    pub async fn list_peers(&self) -> Result<Vec<String>> {
        let url = format!("{}{}", self.base_url, paths::PEERS);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| crate::directory_error!("list peers: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(crate::directory_error!("list peers: {}", status));
        }
        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| WhisperError::Directory(format!("list peers: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let client = DirectoryClient::new("127.0.0.1:8000", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");

        let client = DirectoryClient::new("http://dir.local:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://dir.local:8000");
    }

    #[test]
    fn test_missing_directory_is_config_error() {
        let result = DirectoryClient::new("  ", Duration::from_secs(1));
        assert!(matches!(result, Err(WhisperError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_directory() {
        let closed = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().to_string()
        };
        let client = DirectoryClient::new(&closed, Duration::from_secs(1)).unwrap();

        assert!(matches!(
            client.register("10.0.0.1:9000").await,
            Err(WhisperError::Directory(_))
        ));
        assert!(matches!(
            client.list_peers().await,
            Err(WhisperError::Directory(_))
        ));
    }
}
