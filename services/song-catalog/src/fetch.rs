//!
//! src/fetch.rs  Andrew Belles  Oct 19th, 2026
//!
//! Defines methods for hitting the external song detail provider
//! and turning its responses into a SongDetail or a typed failure
//!

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header, redirect, RequestBuilder};
use url::Url;

use crate::config::{HttpConfig, ProviderConfig};
use crate::errors::CatalogError;
use crate::types::{SongDetail, SongKey};

/// Client building functionality
fn client_helper(http: &HttpConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(http.timeout)
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Some(http.pool_idle_timeout))
        .redirect(redirect::Policy::limited(http.max_redirects as usize))
}

fn client_with_headers(http: &HttpConfig, headers: header::HeaderMap) ->
    Result<Client, CatalogError> {
    client_helper(http)
        .default_headers(headers)
        .user_agent(concat!("song-catalog/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CatalogError::Http(format!("build client: {e}")))
}

pub fn base_client(http: &HttpConfig) -> Result<Client, CatalogError> {
    let mut h = header::HeaderMap::new();
    h.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    client_with_headers(http, h)
}

///
/// Source of enrichment data for songs missing from the catalog.
/// Err(NotFound) when the provider has no match, Err(Upstream) on any
/// other failure
///
#[async_trait]
pub trait DetailProvider: Send + Sync {
    async fn lookup(&self, key: &SongKey) -> Result<SongDetail, CatalogError>;
}

#[derive(Clone, Debug)]
pub struct ProviderClient {
    pub http: Client,
    pub base: Url
}

impl ProviderClient {
    pub fn new(http_config: &HttpConfig, cfg: &ProviderConfig) ->
        Result<Self, CatalogError> {
        let http = base_client(http_config)?;
        Ok( Self { http, base: cfg.base_url.clone() } )
    }

    /// GET {base}/info?group=...&song=...
    pub fn info(&self, key: &SongKey) -> Result<RequestBuilder, CatalogError> {
        let url = self.base.join("info")
            .map_err(|e| CatalogError::Config(format!("provider url: {e}")))?;
        Ok( self.http.get(url).query(&[("group", key.group()), ("song", key.title())]) )
    }
}

#[async_trait]
impl DetailProvider for ProviderClient {
    #[tracing::instrument(skip(self, key), fields(key = %key))]
    async fn lookup(&self, key: &SongKey) -> Result<SongDetail, CatalogError> {
        let response = self.info(key)?
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, timeout = e.is_timeout(), "provider.lookup.failed");
                CatalogError::Upstream(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::info!("provider.lookup.miss");
            return Err(CatalogError::NotFound(format!("{key} unknown to provider")));
        }
        if !status.is_success() {
            tracing::error!(status = %status, "provider.lookup.failed");
            return Err(CatalogError::Upstream(format!("provider answered {status}")));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!(error = %e, "provider.lookup.unreadable");
            CatalogError::Upstream(format!("read body: {e}"))
        })?;

        serde_json::from_slice::<SongDetail>(&body).map_err(|e| {
            tracing::error!(error = %e, "provider.lookup.malformed");
            CatalogError::Upstream(format!("malformed body: {e}"))
        })
    }
}
