//! Client for the upstream book catalog (Google Books `volumes` API shape).

use std::time::Duration;

use anyhow::Context;
use axum::http::StatusCode;
use reqwest::Client;
use serde::Deserialize;
use serde_json::value::RawValue;
use thiserror::Error;

use folio_kernel::settings::UpstreamSettings;

use super::models::{PageRequest, SearchQuery};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog returned status {0}")]
    Status(StatusCode),

    #[error("catalog request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("catalog unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("catalog sent an unreadable body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl CatalogError {
    fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout(err)
        } else if err.is_decode() {
            CatalogError::Decode(err)
        } else {
            CatalogError::Transport(err)
        }
    }
}

/// One page of catalog records plus the catalog's declared total.
///
/// Records stay as the exact JSON text the catalog sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogPage {
    #[serde(rename = "totalItems", default)]
    pub total_items: u64,
    #[serde(default)]
    pub items: Vec<Box<RawValue>>,
}

/// Long-lived catalog client. Holds one connection pool for the whole process.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(settings: &UpstreamSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_millis(settings.timeout_ms))
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .pool_idle_timeout(Duration::from_millis(settings.pool_idle_timeout_ms))
            .build()
            .context("failed to create catalog HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of results.
    ///
    /// Exactly one GET is issued; nothing is retried.
    pub async fn search(
        &self,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<CatalogPage, CatalogError> {
        let q = query.to_string();
        let offset = page.offset();
        let limit = page.results_per_page();

        tracing::debug!(query = %q, offset, limit, "querying catalog");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", q.as_str()),
                ("startIndex", offset.to_string().as_str()),
                ("maxResults", limit.to_string().as_str()),
            ])
            .send()
            .await
            .map_err(CatalogError::classify)?;

        // Anything but 200, other 2xx included, is handed back to the caller.
        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(query = %q, status = status.as_u16(), "catalog rejected search");
            return Err(CatalogError::Status(status));
        }

        let page: CatalogPage = response.json().await.map_err(CatalogError::classify)?;

        tracing::debug!(
            query = %q,
            total_items = page.total_items,
            returned = page.items.len(),
            "catalog answered"
        );
        Ok(page)
    }
}
