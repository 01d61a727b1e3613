use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::GeotileError;

/// Default user agent of the http loader.
pub const DEFAULT_USER_AGENT: &str = concat!("geotile/", env!("CARGO_PKG_VERSION"));

/// Loads raw tile data by url.
#[async_trait]
pub trait TileLoader: Send + Sync {
    /// Loads the data. Any failure (network, non-success status, ...) is an error.
    async fn load(&self, url: &str) -> Result<Bytes, GeotileError>;
}

/// Loader downloading tiles with HTTP GET requests.
#[derive(Debug, Clone)]
pub struct HttpTileLoader {
    http_client: reqwest::Client,
}

impl HttpTileLoader {
    /// Creates a new loader.
    ///
    /// `proxy` is the url of a proxy all requests are sent through.
    pub fn new(
        user_agent: &str,
        proxy: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, GeotileError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
        })
    }
}

#[async_trait]
impl TileLoader for HttpTileLoader {
    async fn load(&self, url: &str) -> Result<Bytes, GeotileError> {
        log::info!("Loading {url}");
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            log::info!("Failed to load {url}: {status}");
            return Err(GeotileError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?)
    }
}
