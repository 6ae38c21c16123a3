//! Configuration file watcher for hot reload.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::schema::ServiceConfig;
use crate::config::store::ConfigStore;

/// Watches the store's backing file and reloads it when it changes.
pub struct ConfigWatcher {
    store: Arc<ConfigStore>,
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<Arc<ServiceConfig>>,
}

impl ConfigWatcher {
    /// Create a watcher for the file the store was loaded from.
    ///
    /// Returns `None` when the store has no path. Otherwise returns the
    /// watcher and a receiver for freshly published snapshots.
    pub fn new(
        store: Arc<ConfigStore>,
    ) -> Option<(Self, mpsc::UnboundedReceiver<Arc<ServiceConfig>>)> {
        let path = store.config_path()?;
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        Some((
            Self {
                store,
                path,
                update_tx,
            },
            update_rx,
        ))
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let store = self.store.clone();
        let tx = self.update_tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    // Editors often emit several events per save.
                    if !store.is_config_modified() {
                        return;
                    }
                    tracing::info!("Config file change detected, reloading...");
                    match store.reload() {
                        Ok(()) => {
                            let _ = tx.send(store.snapshot());
                        }
                        Err(e) => {
                            tracing::error!(
                                "Failed to reload config: {}. Keeping current configuration.",
                                e
                            );
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}
