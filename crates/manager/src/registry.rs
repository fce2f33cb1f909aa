//! Durable, cached registry of mod records and the update notification bus

use crate::models::Mod;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Observer of mod lifecycle changes
pub trait ModUpdateListener: Send + Sync {
    fn on_mod_updated(&self, entry: &Mod, deleted: bool);
}

/// Explicit publish/subscribe registry for mod updates.
///
/// Listeners are invoked synchronously, in subscription order, on the
/// triggering thread.
pub struct ModUpdateNotifier {
    listeners: Mutex<Vec<Arc<dyn ModUpdateListener>>>,
}

impl ModUpdateNotifier {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn ModUpdateListener>) {
        self.listeners.lock().unwrap().push(listener);
    }

    pub fn notify(&self, entry: &Mod, deleted: bool) {
        let listeners = self.listeners.lock().unwrap().clone();
        for listener in listeners {
            listener.on_mod_updated(entry, deleted);
        }
    }
}

impl Default for ModUpdateNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Durable key-value store of mods, keyed by id, with an in-memory cache.
///
/// The durable copy is a single JSON file read entirely on cache miss and
/// rewritten entirely on every mutation. Absence of the file is an empty
/// set. Persistence failures are logged, not thrown: a failed save leaves
/// the cache ahead of durable storage until the next successful save.
pub struct ModRegistry {
    path: PathBuf,
    cache: Mutex<Option<HashMap<String, Mod>>>,
}

impl ModRegistry {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    fn load(&self) -> HashMap<String, Mod> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read mod registry");
                return HashMap::new();
            }
        };
        match serde_json::from_str::<Vec<Mod>>(&text) {
            Ok(mods) => mods.into_iter().map(|m| (m.id.clone(), m)).collect(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "mod registry file is corrupt");
                HashMap::new()
            }
        }
    }

    fn save(&self, mods: &HashMap<String, Mod>) {
        let mut entries: Vec<&Mod> = mods.values().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));

        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let text = serde_json::to_string_pretty(&entries)?;
            std::fs::write(&self.path, text)
        };
        if let Err(e) = write() {
            warn!(path = %self.path.display(), error = %e, "failed to persist mod registry");
        }
    }

    /// Current snapshot of all mods (a defensive copy, not a live view)
    pub fn get_all(&self) -> Vec<Mod> {
        let mut cache = self.cache.lock().unwrap();
        let mods = cache.get_or_insert_with(|| self.load());
        mods.values().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<Mod> {
        let mut cache = self.cache.lock().unwrap();
        let mods = cache.get_or_insert_with(|| self.load());
        mods.get(id).cloned()
    }

    /// Drop the cache; the next read reloads from durable storage
    pub fn invalidate(&self) {
        *self.cache.lock().unwrap() = None;
    }

    /// Apply one mod mutation: reload the authoritative set, upsert or
    /// remove, persist, and repopulate the cache from the persisted set so
    /// subsequent reads observe this write.
    pub fn apply_update(&self, entry: &Mod, deleted: bool) {
        let mut cache = self.cache.lock().unwrap();
        *cache = None;

        let mut mods = self.load();
        mods.remove(&entry.id);
        if !deleted {
            mods.insert(entry.id.clone(), entry.clone());
        }
        self.save(&mods);
        debug!(id = %entry.id, deleted, "mod registry updated");

        *cache = Some(mods);
    }
}

impl ModUpdateListener for ModRegistry {
    fn on_mod_updated(&self, entry: &Mod, deleted: bool) {
        self.apply_update(entry, deleted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModListing;
    use tempfile::tempdir;
    use url::Url;

    fn sample(id: &str, enabled: bool) -> Mod {
        ModListing {
            id: id.to_string(),
            name: format!("Mod {id}"),
            creator: None,
            newest_file_name: format!("{id}.zip"),
            download_url: Url::parse("https://mods.example/files/a.zip").unwrap(),
            image_url: None,
            page_url: Url::parse("https://mods.example/page").unwrap(),
            updated_on: Some(1_700_000_000),
            supported_version: None,
        }
        .into_mod(enabled)
    }

    #[test]
    fn missing_file_is_an_empty_set() {
        let dir = tempdir().unwrap();
        let registry = ModRegistry::new(dir.path().join("mods.json"));
        assert!(registry.get_all().is_empty());
    }

    #[test]
    fn round_trip_survives_cache_invalidation() {
        let dir = tempdir().unwrap();
        let registry = ModRegistry::new(dir.path().join("mods.json"));

        let mut entry = sample("220221", true);
        entry.update_available = true;
        registry.apply_update(&entry, false);
        registry.apply_update(&sample("100", false), false);

        // Simulate a process restart
        registry.invalidate();
        let mods = registry.get_all();
        assert_eq!(mods.len(), 2);
        let reloaded = registry.get("220221").unwrap();
        assert!(reloaded.enabled);
        assert!(!reloaded.update_available, "transient flag must not persist");
        assert_eq!(reloaded.newest_file_name.as_deref(), Some("220221.zip"));
    }

    #[test]
    fn upsert_replaces_and_delete_removes() {
        let dir = tempdir().unwrap();
        let registry = ModRegistry::new(dir.path().join("mods.json"));

        registry.apply_update(&sample("220221", false), false);
        let mut renamed = sample("220221", true);
        renamed.name = "Renamed".to_string();
        registry.apply_update(&renamed, false);

        let mods = registry.get_all();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].name, "Renamed");
        assert!(mods[0].enabled);

        registry.apply_update(&renamed, true);
        assert!(registry.get_all().is_empty());
        registry.invalidate();
        assert!(registry.get_all().is_empty(), "delete must be durable");
    }

    #[test]
    fn reads_observe_writes_without_invalidation() {
        let dir = tempdir().unwrap();
        let registry = ModRegistry::new(dir.path().join("mods.json"));
        registry.get_all();
        registry.apply_update(&sample("1", false), false);
        assert_eq!(registry.get_all().len(), 1);
    }

    #[test]
    fn corrupt_file_degrades_to_empty_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mods.json");
        std::fs::write(&path, "{not json").unwrap();
        let registry = ModRegistry::new(path);
        assert!(registry.get_all().is_empty());
    }

    #[test]
    fn notifier_invokes_listeners_in_subscription_order() {
        struct Recorder {
            order: Mutex<Vec<&'static str>>,
        }
        struct Tagged {
            tag: &'static str,
            recorder: Arc<Recorder>,
        }
        impl ModUpdateListener for Tagged {
            fn on_mod_updated(&self, _entry: &Mod, _deleted: bool) {
                self.recorder.order.lock().unwrap().push(self.tag);
            }
        }

        let recorder = Arc::new(Recorder {
            order: Mutex::new(Vec::new()),
        });
        let notifier = ModUpdateNotifier::new();
        notifier.subscribe(Arc::new(Tagged {
            tag: "registry",
            recorder: recorder.clone(),
        }));
        notifier.subscribe(Arc::new(Tagged {
            tag: "ui",
            recorder: recorder.clone(),
        }));

        notifier.notify(&sample("1", false), false);
        assert_eq!(*recorder.order.lock().unwrap(), vec!["registry", "ui"]);
    }
}
