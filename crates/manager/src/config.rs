//! Configuration for the mod manager

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Paths and tuning knobs shared by every component of the manager
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Durable registry file holding the serialized mod set
    pub registry_path: PathBuf,
    /// Cache directory for downloaded mod archives, keyed by file name
    pub archive_cache_dir: PathBuf,
    /// Cache directory for mod images, keyed by mod id + ".jpg"
    pub image_cache_dir: PathBuf,
    /// The game's data directory that enable/disable operations mutate
    pub game_data_dir: PathBuf,
    /// Width of the download worker pool
    pub download_pool_width: usize,
    /// Depth of each pool's bounded work queue
    pub queue_depth: usize,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl ManagerConfig {
    /// Derive the standard directory layout under a single root
    pub fn for_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            registry_path: root.join("mods.json"),
            archive_cache_dir: root.join("archives"),
            image_cache_dir: root.join("images"),
            game_data_dir: root.join("gamedata"),
            ..Self::default()
        }
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("mods.json"),
            archive_cache_dir: PathBuf::from("archives"),
            image_cache_dir: PathBuf::from("images"),
            game_data_dir: PathBuf::from("gamedata"),
            download_pool_width: crate::manager::NUM_CONCURRENT_DOWNLOADS,
            queue_depth: 32,
            http_timeout: Duration::from_secs(30),
            user_agent: "manager/0.1.0".to_string(),
        }
    }
}
