//! Mod metadata sources
//!
//! A `ModSource` turns a mod page URL into a structured `ModListing`. The
//! registry routes each URL to the first source claiming its host; how a
//! particular website's markup is scraped is a detail of the source
//! implementation and not this crate's concern.

pub mod manifest;

pub use manifest::ManifestSource;

use crate::error::SourceError;
use crate::models::ModListing;
use async_trait::async_trait;
use url::Url;

/// A collaborator that can resolve mod metadata for some set of hosts
#[async_trait]
pub trait ModSource: Send + Sync {
    /// Whether this source recognizes the URL's host
    fn supports_url(&self, url: &Url) -> bool;

    /// Fetch and parse the page into a structured listing
    async fn fetch_listing(&self, page_url: &Url) -> Result<ModListing, SourceError>;
}

/// Ordered registry of metadata sources, routed by URL host
pub struct SourceRegistry {
    sources: Vec<Box<dyn ModSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: ModSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// First source claiming the URL, or `UnsupportedHost`
    pub fn find_source(&self, url: &Url) -> Result<&dyn ModSource, SourceError> {
        self.sources
            .iter()
            .find(|source| source.supports_url(url))
            .map(|source| source.as_ref())
            .ok_or_else(|| SourceError::UnsupportedHost {
                url: url.to_string(),
                host: url.host_str().unwrap_or("unknown").to_string(),
            })
    }

    pub async fn fetch_listing(&self, page_url: &Url) -> Result<ModListing, SourceError> {
        self.find_source(page_url)?.fetch_listing(page_url).await
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HostOnly(&'static str);

    #[async_trait]
    impl ModSource for HostOnly {
        fn supports_url(&self, url: &Url) -> bool {
            url.host_str() == Some(self.0)
        }

        async fn fetch_listing(&self, page_url: &Url) -> Result<ModListing, SourceError> {
            Err(SourceError::CannotAddMod {
                url: page_url.to_string(),
                source: "not a real source".into(),
            })
        }
    }

    #[test]
    fn unknown_host_is_rejected() {
        let registry = SourceRegistry::new().register(HostOnly("mods.example"));
        let url = Url::parse("https://elsewhere.example/mod/1").unwrap();
        let error = registry
            .find_source(&url)
            .err()
            .expect("host should be rejected");
        match error {
            SourceError::UnsupportedHost { host, .. } => {
                assert_eq!(host, "elsewhere.example");
            }
            other => panic!("expected UnsupportedHost, got {other}"),
        }
    }

    #[test]
    fn first_claiming_source_wins() {
        let registry = SourceRegistry::new()
            .register(HostOnly("mods.example"))
            .register(HostOnly("other.example"));
        let url = Url::parse("https://mods.example/mod/1").unwrap();
        assert!(registry.find_source(&url).is_ok());
    }
}
