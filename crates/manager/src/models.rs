//! Mod data model and the structured metadata record returned by sources

use crate::config::ManagerConfig;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use url::Url;

/// A managed mod and its lifecycle flags.
///
/// Two flags drive presentation and scheduling: `enabled` is persisted with
/// the record, `update_available` is transient and resets to false whenever
/// the registry is reloaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mod {
    /// Opaque identity derived from the source page; equality is by id alone
    pub id: String,
    pub name: String,
    pub creator: Option<String>,
    /// File name of the currently cached archive, if any
    pub newest_file_name: Option<String>,
    /// Game version string this mod version supports
    pub supported_version: Option<String>,
    pub image_url: Option<Url>,
    pub page_url: Url,
    /// Unix timestamp of the last update on the source page
    pub updated_on: Option<i64>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(skip)]
    pub update_available: bool,
}

impl Mod {
    /// Expected path of the cached archive, if the mod has a known file name
    pub fn cached_archive_path(&self, config: &ManagerConfig) -> Option<PathBuf> {
        self.newest_file_name
            .as_ref()
            .map(|name| config.archive_cache_dir.join(name))
    }

    pub fn cached_image_path(&self, config: &ManagerConfig) -> PathBuf {
        config.image_cache_dir.join(format!("{}.jpg", self.id))
    }

    /// Presence of the archive in the local cache is the sole download signal
    pub fn is_downloaded(&self, config: &ManagerConfig) -> bool {
        self.cached_archive_path(config)
            .map(|path| path.exists())
            .unwrap_or(false)
    }
}

impl PartialEq for Mod {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Mod {}

impl Hash for Mod {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Structured record a mod source produces for one page
#[derive(Debug, Clone, PartialEq)]
pub struct ModListing {
    pub id: String,
    pub name: String,
    pub creator: Option<String>,
    pub newest_file_name: String,
    pub download_url: Url,
    pub image_url: Option<Url>,
    pub page_url: Url,
    pub updated_on: Option<i64>,
    pub supported_version: Option<String>,
}

impl ModListing {
    /// Build the registry record for this listing, carrying over `enabled`
    /// from any previous version of the mod
    pub fn into_mod(self, enabled: bool) -> Mod {
        Mod {
            id: self.id,
            name: self.name,
            creator: self.creator,
            newest_file_name: Some(self.newest_file_name),
            supported_version: self.supported_version,
            image_url: self.image_url,
            page_url: self.page_url,
            updated_on: self.updated_on,
            enabled,
            update_available: false,
        }
    }
}
