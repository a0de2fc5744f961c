// Per-folder trailing-edge debouncer.
//
// Every qualifying event restarts a single timer for the folder. When the
// timer survives a full quiet window the folder is committed once, on the
// blocking pool, outside the state lock. Commits for one folder never overlap:
// a timer that fires while a commit runs waits its turn and stays cancellable.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use gac_common::types::{CommitResult, RepoConfig};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace};

use super::{ChangeHandler, FsEvent, FsEventKind};
use crate::git::sync::{commit_and_push, DEFAULT_COMMIT_MESSAGE};

/// Name of the VCS metadata directory whose contents never trigger commits.
const VCS_DIR: &str = ".git";

/// Performs the commit once a folder has gone quiet.
pub trait CommitRunner: Send + Sync + 'static {
    fn run(&self, folder: &Path, config: &RepoConfig) -> CommitResult;
}

/// Runs `git add -A`, `commit` and an authenticated `push`.
#[derive(Debug, Clone)]
pub struct GitCommitRunner {
    message: String,
}

impl GitCommitRunner {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl Default for GitCommitRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMIT_MESSAGE)
    }
}

impl CommitRunner for GitCommitRunner {
    fn run(&self, folder: &Path, config: &RepoConfig) -> CommitResult {
        commit_and_push(folder, config, &self.message)
    }
}

/// True if `relative` has a `.git` component. `.gitignore` and friends do not match.
pub fn is_vcs_metadata(relative: &Path) -> bool {
    relative.components().any(|c| matches!(c, Component::Normal(name) if name == VCS_DIR))
}

#[derive(Default)]
struct DebounceState {
    last_event_at: Option<Instant>,
    pending: Option<JoinHandle<()>>,
    /// Bumped on every reschedule; a timer only fires if it still holds the latest value.
    generation: u64,
}

struct Inner {
    folder: PathBuf,
    /// Canonical form of `folder`, matching the paths the backend reports.
    canonical: PathBuf,
    config: RepoConfig,
    window: Duration,
    runner: Arc<dyn CommitRunner>,
    runtime: Handle,
    state: Mutex<DebounceState>,
    /// Held for the whole commit-and-push run.
    commit_turn: tokio::sync::Mutex<()>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, DebounceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fire_at(self: Arc<Self>, deadline: Instant, generation: u64) {
        tokio::time::sleep_until(deadline).await;
        if self.lock_state().generation != generation {
            return;
        }

        let _turn = self.commit_turn.lock().await;
        {
            let mut state = self.lock_state();
            if state.generation != generation {
                return;
            }
            // From here on the commit is in flight and no longer cancellable.
            state.pending = None;
        }

        info!(folder = %self.folder.display(), "folder quiet, committing");
        let inner = Arc::clone(&self);
        let outcome =
            tokio::task::spawn_blocking(move || inner.runner.run(&inner.folder, &inner.config))
                .await;

        match outcome {
            Ok(result) if result.success => {
                info!(folder = %self.folder.display(), result = %result.message, "auto-commit finished");
            }
            Ok(result) => {
                error!(folder = %self.folder.display(), error = %result.message, "auto-commit failed");
            }
            Err(e) => {
                error!(folder = %self.folder.display(), error = %e, "auto-commit task aborted");
            }
        }
    }
}

/// Debounces the change stream of a single folder into commits.
pub struct DebouncedChangeHandler {
    inner: Arc<Inner>,
}

impl DebouncedChangeHandler {
    /// Timers are spawned on `runtime`, so events may arrive from any thread.
    pub fn new(
        folder: impl Into<PathBuf>,
        config: RepoConfig,
        runner: Arc<dyn CommitRunner>,
        window: Duration,
        runtime: Handle,
    ) -> Self {
        let folder = folder.into();
        let canonical = folder.canonicalize().unwrap_or_else(|_| folder.clone());
        Self {
            inner: Arc::new(Inner {
                folder,
                canonical,
                config,
                window,
                runner,
                runtime,
                state: Mutex::new(DebounceState::default()),
                commit_turn: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.inner.folder
    }

    /// Whether a commit is scheduled (or waiting on a running one) but has not started yet.
    pub fn has_pending(&self) -> bool {
        self.inner.lock_state().pending.is_some()
    }

    /// Time of the most recent qualifying event, if any.
    pub fn last_event_at(&self) -> Option<Instant> {
        self.inner.lock_state().last_event_at
    }

    /// Drop the scheduled commit, if any. A commit already running is left alone.
    pub fn cancel_pending(&self) -> bool {
        let mut state = self.inner.lock_state();
        state.generation = state.generation.wrapping_add(1);
        match state.pending.take() {
            Some(handle) => {
                handle.abort();
                debug!(folder = %self.inner.folder.display(), "pending commit cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether `event` should restart the timer.
    pub fn qualifies(&self, event: &FsEvent) -> bool {
        if event.kind == FsEventKind::Created && event.is_dir {
            return false;
        }
        let relative = event
            .path
            .strip_prefix(&self.inner.canonical)
            .or_else(|_| event.path.strip_prefix(&self.inner.folder))
            .unwrap_or(&event.path);
        !is_vcs_metadata(relative)
    }

    fn reschedule(&self) {
        let now = Instant::now();
        let deadline = now + self.inner.window;

        let mut state = self.inner.lock_state();
        state.last_event_at = Some(now);
        if let Some(previous) = state.pending.take() {
            previous.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;

        let inner = Arc::clone(&self.inner);
        state.pending = Some(self.inner.runtime.spawn(inner.fire_at(deadline, generation)));
    }
}

impl ChangeHandler for DebouncedChangeHandler {
    fn on_event(&self, event: FsEvent) {
        if !self.qualifies(&event) {
            trace!(path = %event.path.display(), kind = ?event.kind, "ignoring event");
            return;
        }
        debug!(
            folder = %self.inner.folder.display(),
            path = %event.path.display(),
            kind = ?event.kind,
            "change detected, restarting debounce timer"
        );
        self.reschedule();
    }
}

impl Drop for DebouncedChangeHandler {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
