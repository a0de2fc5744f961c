// File watcher: inotify/fsevents → FsEvent → per-folder debounced commit.
// This module handles the first stage: OS subscription and event translation.

pub mod debounce;
pub mod registry;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tracing::{debug, error, trace, warn};

/// Kind of a filesystem change, as seen by the change handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    /// File or directory was created.
    Created,
    /// Content or metadata changed.
    Modified,
    /// File or directory was removed.
    Deleted,
    /// Rename; emitted for the old and/or new path.
    Moved,
}

/// A translated filesystem event for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
    /// True when the path is (or was) a directory, as far as the backend knows.
    pub is_dir: bool,
}

impl FsEvent {
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self { kind, path: path.into(), is_dir: false }
    }

    pub fn dir(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self { kind, path: path.into(), is_dir: true }
    }
}

/// Receives the events of one watched folder, in arrival order.
pub trait ChangeHandler: Send + Sync {
    fn on_event(&self, event: FsEvent);
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("already watching `{}`", .0.display())]
    AlreadyWatching(PathBuf),

    #[error("failed to watch `{}`: {source}", .path.display())]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// A live recursive subscription delivering into a `ChangeHandler`.
///
/// Delivery passes through a gate; `stop` closes it after tearing down the
/// OS watch and only returns once no delivery is in progress.
pub struct FolderSubscription {
    watcher: Option<RecommendedWatcher>,
    root: PathBuf,
    gate: Arc<Mutex<bool>>,
}

impl FolderSubscription {
    /// Start watching `root` recursively. The backend delivers on its own
    /// thread; this call does not block on events.
    pub fn start(root: &Path, handler: Arc<dyn ChangeHandler>) -> Result<Self, WatchError> {
        let root = root.canonicalize().map_err(|e| WatchError::Subscribe {
            path: root.to_path_buf(),
            source: notify::Error::io(e),
        })?;

        let gate = Arc::new(Mutex::new(true));
        let delivery_gate = Arc::clone(&gate);
        let root_for_filter = root.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let open = delivery_gate.lock().unwrap_or_else(PoisonError::into_inner);
            if !*open {
                return;
            }
            match res {
                Ok(event) => {
                    for fs_event in translate_event(&event, &root_for_filter) {
                        handler.on_event(fs_event);
                    }
                }
                Err(e) => {
                    error!(root = %root_for_filter.display(), error = %e, "file watcher error");
                }
            }
        })
        .map_err(|source| WatchError::Subscribe { path: root.clone(), source })?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Subscribe { path: root.clone(), source })?;

        debug!(path = %root.display(), "file watcher started");
        Ok(Self { watcher: Some(watcher), root, gate })
    }

    /// The canonicalized root directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Unsubscribe and wait until delivery has quiesced. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.root) {
                debug!(root = %self.root.display(), error = %e, "unwatch failed");
            }
            drop(watcher);
        }
        // Blocks while the backend thread is inside the callback.
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = false;
        debug!(root = %self.root.display(), "file watcher stopped");
    }

    pub fn is_active(&self) -> bool {
        self.watcher.is_some()
    }
}

impl Drop for FolderSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Returns true if the path is inside the watched root (guards against symlink escapes).
fn is_inside_root(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Translate a `notify::Event` into zero or more `FsEvent`s.
fn translate_event(event: &Event, root: &Path) -> Vec<FsEvent> {
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    // Queue overflow: individual events were lost, so report the root as changed.
    if event.need_rescan() {
        warn!(root = %root.display(), "watcher requested rescan, treating root as modified");
        return vec![FsEvent::dir(FsEventKind::Modified, root)];
    }

    let (kind, dir_hint) = match &event.kind {
        EventKind::Create(CreateKind::Folder) => (FsEventKind::Created, Some(true)),
        EventKind::Create(CreateKind::File) => (FsEventKind::Created, Some(false)),
        EventKind::Create(_) => (FsEventKind::Created, None),
        EventKind::Modify(ModifyKind::Name(_)) => (FsEventKind::Moved, None),
        EventKind::Modify(_) => (FsEventKind::Modified, None),
        EventKind::Remove(RemoveKind::Folder) => (FsEventKind::Deleted, Some(true)),
        EventKind::Remove(_) => (FsEventKind::Deleted, Some(false)),
        // Access, Other, Any: reads and opaque backend noise.
        _ => {
            trace!(kind = ?event.kind, "skipping non-change event");
            return Vec::new();
        }
    };

    event
        .paths
        .iter()
        .filter(|p| {
            if is_inside_root(p, root) {
                true
            } else {
                warn!(path = %p.display(), "ignoring event outside watch root (possible symlink escape)");
                false
            }
        })
        .map(|p| FsEvent { kind, path: p.clone(), is_dir: dir_hint.unwrap_or_else(|| p.is_dir()) })
        .collect()
}
