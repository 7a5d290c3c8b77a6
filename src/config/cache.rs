//! Configuration cache with modification-time reload.
//!
//! The cache keeps the last successfully loaded [`Config`] together with the
//! file's modification time at load. A lookup reloads only when the path
//! changes or the modification time strictly advances; otherwise the cached
//! `Arc<Config>` is handed out without touching the file contents.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::config::expand_home;
use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::Config;

#[derive(Debug)]
struct Snapshot {
    path: PathBuf,
    modified: Option<SystemTime>,
    config: Arc<Config>,
}

/// Last loaded configuration, shared between callers.
///
/// Readers never block on each other. The stat-then-reload sequence is
/// serialized, and a reload publishes a fully built `Config` in one swap.
#[derive(Debug)]
pub struct ConfigCache {
    current: ArcSwapOption<Snapshot>,
    reload: Mutex<()>,
    loads: AtomicUsize,
}

impl ConfigCache {
    /// Create an empty cache. Nothing is read until the first [`get`](Self::get).
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
            reload: Mutex::new(()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Get the configuration at `path`, loading or reloading as needed.
    ///
    /// Errors are only returned when no configuration for `path` has been
    /// loaded yet. Once one has, stat or read failures keep serving it.
    pub fn get(&self, path: &Path) -> Result<Arc<Config>, ConfigError> {
        let path = expand_home(path);
        let modified = modified_time(&path);

        if let Some(config) = self.fresh(&path, modified) {
            return Ok(config);
        }

        let _guard = self.reload.lock();
        // Another caller may have reloaded while we waited for the lock.
        if let Some(config) = self.fresh(&path, modified) {
            return Ok(config);
        }

        let previous = self
            .current
            .load_full()
            .filter(|snapshot| snapshot.path == path);

        match load_config(&path) {
            Ok(config) => {
                let config = Arc::new(config);
                self.current.store(Some(Arc::new(Snapshot {
                    path: path.clone(),
                    modified,
                    config: Arc::clone(&config),
                })));
                let loads = self.loads.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::debug!(path = %path.display(), loads, "config loaded");
                Ok(config)
            }
            Err(e) => match previous {
                Some(snapshot) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "config reload failed, keeping current configuration"
                    );
                    Ok(Arc::clone(&snapshot.config))
                }
                None => Err(e),
            },
        }
    }

    /// Number of successful file loads so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// The cached config for `path` if it does not need a reload.
    fn fresh(&self, path: &Path, modified: Option<SystemTime>) -> Option<Arc<Config>> {
        let guard = self.current.load();
        let snapshot = guard.as_ref()?;
        if snapshot.path != path {
            return None;
        }

        let stale = match (modified, snapshot.modified) {
            (Some(now), Some(loaded)) => now > loaded,
            (Some(_), None) => true,
            // Stat failed: keep serving what we have.
            (None, _) => false,
        };
        (!stale).then(|| Arc::clone(&snapshot.config))
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new()
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
