use super::source::{TileSource, UrlTemplateSource};
use crate::core::config::TileLoaderConfig;
use crate::core::geo::TileCoord;
use crate::{MapError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::time::Duration;

/// Shared async HTTP client so connection pools and TLS sessions are reused
/// across every tile of every render.
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("tileprint/", env!("CARGO_PKG_VERSION")))
        .tcp_keepalive(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(16)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
});

/// Retrieves the raw encoded bytes of one tile.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, coord: TileCoord) -> Result<Vec<u8>>;
}

/// Fetches tiles over HTTP from a [`TileSource`], retrying failed requests.
pub struct HttpTileFetcher {
    client: reqwest::Client,
    source: Box<dyn TileSource>,
    user_agent: String,
    max_retries: u32,
    retry_delay: Duration,
    timeout: Duration,
}

impl HttpTileFetcher {
    pub fn new(source: Box<dyn TileSource>, config: &TileLoaderConfig) -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
            source,
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            timeout: config.request_timeout(),
        }
    }

    pub fn from_config(config: &TileLoaderConfig) -> Self {
        Self::new(Box::new(UrlTemplateSource::from_config(config)), config)
    }

    async fn fetch_once(&self, url: &str, coord: TileCoord) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MapError::TileUnavailable(format!(
                "HTTP {} for tile {}",
                response.status(),
                coord
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, coord: TileCoord) -> Result<Vec<u8>> {
        let url = self.source.url(coord);
        let attempts = self.max_retries + 1;

        let mut attempt = 1;
        loop {
            log::debug!("fetch tile {} attempt {}", coord, attempt);
            match self.fetch_once(&url, coord).await {
                Ok(data) => {
                    log::debug!("downloaded tile {} ({} bytes)", coord, data.len());
                    return Ok(data);
                }
                Err(e) if attempt < attempts => {
                    log::warn!("tile {} download failed on attempt {}: {}", coord, attempt, e);
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
