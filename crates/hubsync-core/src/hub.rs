//! Content type hub client.
//!
//! Two calls: list the catalog (`POST /content-types`) and download one
//! library archive (`GET /content-types/{machine_name}`). The base URL is
//! asked of the [`EndpointSource`] on every call and never cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use hubsync_schema::Catalog;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

use crate::config::{EndpointSource, endpoint_url};
use crate::error::ErrorClass;
use crate::host::CatalogSource;

/// Fixed timeout for every hub request.
pub const HUB_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum HubError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Hub responded with HTTP {0}")]
    HttpStatus(u16),

    #[error("Invalid catalog response: {0}")]
    Decode(String),

    #[error("Hub endpoint unavailable: {0}")]
    Endpoint(String),
}

impl HubError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Transport(_) => ErrorClass::Transport,
            Self::HttpStatus(_) | Self::Decode(_) => ErrorClass::Protocol,
            Self::Endpoint(_) => ErrorClass::Configuration,
        }
    }
}

/// HTTP client for a content type hub.
#[derive(Clone)]
pub struct HubClient {
    client: Client,
    endpoint: Arc<dyn EndpointSource>,
}

impl std::fmt::Debug for HubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubClient").finish_non_exhaustive()
    }
}

impl HubClient {
    pub fn new(endpoint: Arc<dyn EndpointSource>) -> Result<Self, HubError> {
        let client = Client::builder()
            .timeout(HUB_TIMEOUT)
            .user_agent(crate::USER_AGENT)
            .build()?;
        Ok(Self { client, endpoint })
    }

    /// Build a full URL from the endpoint as configured right now, appending
    /// each of `segments` as one escaped path segment.
    fn url(&self, segments: &[&str]) -> Result<Url, HubError> {
        let base = self
            .endpoint
            .endpoint_base()
            .map_err(|e| HubError::Endpoint(e.to_string()))?;
        let base = endpoint_url(&base);
        let mut url = Url::parse(&base).map_err(|e| HubError::Endpoint(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| HubError::Endpoint(format!("{base}: not a base URL")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// List every content type the hub offers.
    ///
    /// `site_identifier` is a throwaway v4 UUID; the hub does not check it.
    pub async fn fetch_catalog(&self, site_identifier: &str) -> Result<Catalog, HubError> {
        let url = self.url(&["content-types"])?;
        tracing::debug!(%url, "fetching content type catalog");

        let response = self
            .client
            .post(url)
            .form(&[("uuid", site_identifier)])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(HubError::HttpStatus(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        let catalog = Catalog::from_json(&body).map_err(|e| HubError::Decode(e.to_string()))?;
        tracing::debug!(entries = catalog.len(), "catalog received");
        Ok(catalog)
    }

    /// Download the package archive for one content type.
    pub async fn fetch_archive(&self, machine_name: &str) -> Result<Bytes, HubError> {
        let url = self.url(&["content-types", machine_name])?;
        tracing::debug!(%url, machine_name, "downloading content type archive");

        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(HubError::HttpStatus(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        tracing::debug!(machine_name, size = bytes.len(), "archive downloaded");
        Ok(bytes)
    }
}

#[async_trait]
impl CatalogSource for HubClient {
    async fn fetch_catalog(&self, site_identifier: &str) -> Result<Catalog, HubError> {
        HubClient::fetch_catalog(self, site_identifier).await
    }

    async fn fetch_archive(&self, machine_name: &str) -> Result<Bytes, HubError> {
        HubClient::fetch_archive(self, machine_name).await
    }
}
