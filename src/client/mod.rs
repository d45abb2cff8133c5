mod error;
mod http;
mod roles;

pub use error::*;
pub use http::*;
pub use roles::*;

use crate::authenticator::{Configuration, Slice};
use crate::config::ClientConfig;

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

/// The two network operations of a slice.
///
/// Every save sends the complete candidate object; the returned value is the
/// backend's canonical configuration and may differ from what was sent.
#[async_trait]
pub trait ConfigApi: Send + Sync {
    /// Read the current configuration.
    async fn fetch_config(&self) -> Result<Configuration, ClientError>;

    /// Write `candidate` and return the canonical configuration.
    async fn save_config(&self, candidate: &Configuration) -> Result<Configuration, ClientError>;
}

/// HTTP implementation of [`ConfigApi`] for one slice.
#[derive(Debug, Clone)]
pub struct HttpConfigClient {
    transport: ApiTransport,
    slice: Slice,
    url: Url,
}

impl HttpConfigClient {
    pub fn new(transport: ApiTransport, slice: Slice) -> Result<Self, ClientError> {
        let url = transport.qualify_url(&slice.config_path())?;
        Ok(Self {
            transport,
            slice,
            url,
        })
    }

    pub fn from_config(config: &ClientConfig, slice: Slice) -> Result<Self, ClientError> {
        Self::new(ApiTransport::from_config(config)?, slice)
    }

    pub fn slice(&self) -> Slice {
        self.slice
    }

    /// Fully qualified config endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ConfigApi for HttpConfigClient {
    async fn fetch_config(&self) -> Result<Configuration, ClientError> {
        debug!(slice = %self.slice, url = %self.url, "Fetching authenticator config");
        let response = self.transport.get(self.url.clone()).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<Configuration>().await?)
    }

    async fn save_config(&self, candidate: &Configuration) -> Result<Configuration, ClientError> {
        info!(slice = %self.slice, url = %self.url, "Saving authenticator config");
        let response = self
            .transport
            .put(self.url.clone())
            .json(candidate)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<Configuration>().await?)
    }
}
