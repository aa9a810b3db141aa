// src/services/fetcher.rs

//! Page fetching.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::TargetConfig;
use crate::utils::http::create_async_client;

/// Returns the raw content of a page.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Plain HTTP GET fetcher.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the target's user agent and timeout.
    pub fn new(config: &TargetConfig) -> Result<Self> {
        Ok(Self::with_client(create_async_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let response = response
            .error_for_status()
            .map_err(|e| AppError::fetch(url, e))?;

        let body = response.text().await.map_err(|e| AppError::fetch(url, e))?;
        log::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        let config = TargetConfig {
            timeout_secs: 2,
            ..TargetConfig::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();

        let err = fetcher.fetch("http://127.0.0.1:1/list").await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { ref url, .. } if url == "http://127.0.0.1:1/list"));
    }
}
