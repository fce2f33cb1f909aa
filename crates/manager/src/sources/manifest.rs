//! JSON manifest metadata source
//!
//! Hosts that publish a machine-readable mod manifest are queried directly
//! instead of being scraped: one GET of the page URL with a JSON accept
//! header yields the whole metadata record.

use crate::error::SourceError;
use crate::http::HttpFetcher;
use crate::models::ModListing;
use crate::sources::ModSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Wire format of the remote manifest document
#[derive(Debug, Deserialize)]
struct ManifestRecord {
    id: String,
    name: String,
    creator: Option<String>,
    newest_file_name: String,
    download_url: Url,
    image_url: Option<Url>,
    page_url: Option<Url>,
    updated_on: Option<i64>,
    supported_version: Option<String>,
}

/// Metadata source for a configured set of manifest-publishing hosts
pub struct ManifestSource {
    hosts: Vec<String>,
    fetcher: Arc<HttpFetcher>,
}

impl ManifestSource {
    pub fn new(hosts: Vec<String>, fetcher: Arc<HttpFetcher>) -> Self {
        Self { hosts, fetcher }
    }
}

#[async_trait]
impl ModSource for ManifestSource {
    fn supports_url(&self, url: &Url) -> bool {
        url.host_str()
            .map(|host| self.hosts.iter().any(|h| h == host))
            .unwrap_or(false)
    }

    async fn fetch_listing(&self, page_url: &Url) -> Result<ModListing, SourceError> {
        debug!(url = %page_url, "fetching mod manifest");
        let record: ManifestRecord = self
            .fetcher
            .client()
            .get(page_url.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| cannot_add(page_url, e))?
            .json()
            .await
            .map_err(|e| cannot_add(page_url, e))?;

        Ok(ModListing {
            id: record.id,
            name: record.name,
            creator: record.creator,
            newest_file_name: record.newest_file_name,
            download_url: record.download_url,
            image_url: record.image_url,
            page_url: record.page_url.unwrap_or_else(|| page_url.clone()),
            updated_on: record.updated_on,
            supported_version: record.supported_version,
        })
    }
}

fn cannot_add(url: &Url, source: reqwest::Error) -> SourceError {
    SourceError::CannotAddMod {
        url: url.to_string(),
        source: Box::new(source),
    }
}
