// Registry of live folder watches, one subscription and debouncer per folder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use gac_common::types::RepoConfig;
use tokio::runtime::Handle;
use tracing::{info, warn};

use super::debounce::{CommitRunner, DebouncedChangeHandler};
use super::{FolderSubscription, WatchError};

struct ActiveWatch {
    handler: Arc<DebouncedChangeHandler>,
    subscription: FolderSubscription,
}

/// Owns every active watch. Entries exist only for subscriptions that started.
pub struct FolderWatchRegistry {
    watches: HashMap<PathBuf, ActiveWatch>,
    runner: Arc<dyn CommitRunner>,
    window: Duration,
    runtime: Handle,
}

impl FolderWatchRegistry {
    pub fn new(runner: Arc<dyn CommitRunner>, window: Duration, runtime: Handle) -> Self {
        Self { watches: HashMap::new(), runner, window, runtime }
    }

    /// Subscribe to `folder` recursively and attach a debounced committer.
    pub fn watch_folder(&mut self, folder: &Path, config: RepoConfig) -> Result<(), WatchError> {
        if self.watches.contains_key(folder) {
            warn!(folder = %folder.display(), "folder is already being watched");
            return Err(WatchError::AlreadyWatching(folder.to_path_buf()));
        }

        let handler = Arc::new(DebouncedChangeHandler::new(
            folder,
            config,
            Arc::clone(&self.runner),
            self.window,
            self.runtime.clone(),
        ));
        let subscription = FolderSubscription::start(folder, handler.clone())?;

        info!(folder = %folder.display(), window_secs = self.window.as_secs(), "watching folder");
        self.watches.insert(folder.to_path_buf(), ActiveWatch { handler, subscription });
        Ok(())
    }

    /// Tear down every watch: unsubscribe, then cancel timers that have not
    /// fired. Commits already running finish on their own. Returns how many
    /// watches were stopped.
    pub fn stop_all(&mut self) -> usize {
        let count = self.watches.len();
        for (folder, mut watch) in self.watches.drain() {
            watch.subscription.stop();
            if watch.handler.cancel_pending() {
                warn!(folder = %folder.display(), "discarded pending auto-commit on stop");
            }
            info!(folder = %folder.display(), "stopped watching folder");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    pub fn is_watching(&self, folder: &Path) -> bool {
        self.watches.contains_key(folder)
    }

    /// Watched folders, sorted.
    pub fn folders(&self) -> Vec<PathBuf> {
        let mut folders: Vec<PathBuf> = self.watches.keys().cloned().collect();
        folders.sort();
        folders
    }

    pub fn handler(&self, folder: &Path) -> Option<Arc<DebouncedChangeHandler>> {
        self.watches.get(folder).map(|w| Arc::clone(&w.handler))
    }
}

impl Drop for FolderWatchRegistry {
    fn drop(&mut self) {
        self.stop_all();
    }
}
