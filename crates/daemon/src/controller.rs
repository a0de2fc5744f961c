// Start/stop lifecycle for the set of folder watches.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{error, info, warn};

use crate::config::{ConfigError, FolderSource, FolderStore};
use crate::watcher::debounce::{CommitRunner, GitCommitRunner};
use crate::watcher::registry::FolderWatchRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { folders: usize },
    AlreadyRunning,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("no folders configured for watching")]
    NoFolders,

    #[error("no folder watches could be started")]
    NoWatchesStarted,

    #[error("watcher is not running")]
    NotRunning,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Owns the registry and the Stopped/Running state.
pub struct WatcherController {
    source: Arc<dyn FolderSource>,
    registry: FolderWatchRegistry,
    state: WatcherState,
}

impl WatcherController {
    pub fn new(
        source: Arc<dyn FolderSource>,
        runner: Arc<dyn CommitRunner>,
        window: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            source,
            registry: FolderWatchRegistry::new(runner, window, runtime),
            state: WatcherState::Stopped,
        }
    }

    /// Controller over a config store, using its debounce window and commit message.
    pub fn from_store(store: FolderStore, runtime: Handle) -> Self {
        let settings = store.settings().clone();
        Self::new(
            Arc::new(store),
            Arc::new(GitCommitRunner::new(settings.commit_message.clone())),
            settings.debounce_window(),
            runtime,
        )
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == WatcherState::Running
    }

    pub fn watched_folders(&self) -> Vec<PathBuf> {
        self.registry.folders()
    }

    /// Load the folder list and subscribe to each folder with auto-commit enabled.
    pub fn start_watching(&mut self) -> Result<StartOutcome, LifecycleError> {
        if self.is_running() {
            warn!("watcher is already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let folders = self.source.load_folders()?;
        let enabled: Vec<_> = folders.into_iter().filter(|(_, cfg)| cfg.auto_commit).collect();
        if enabled.is_empty() {
            return Err(LifecycleError::NoFolders);
        }

        for (folder, config) in enabled {
            if let Err(e) = self.registry.watch_folder(&folder, config) {
                error!(folder = %folder.display(), error = %e, "failed to watch folder");
            }
        }

        if self.registry.is_empty() {
            return Err(LifecycleError::NoWatchesStarted);
        }

        let folders = self.registry.len();
        self.state = WatcherState::Running;
        info!(folders, "watcher started");
        Ok(StartOutcome::Started { folders })
    }

    /// Stop every watch. Returns how many were stopped.
    pub fn stop_watching(&mut self) -> Result<usize, LifecycleError> {
        if !self.is_running() {
            warn!("watcher is not running");
            return Err(LifecycleError::NotRunning);
        }

        let stopped = self.registry.stop_all();
        self.state = WatcherState::Stopped;
        info!(folders = stopped, "watcher stopped");
        Ok(stopped)
    }

    /// Start, wait for `shutdown`, then stop.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = ()>,
    {
        self.start_watching()?;
        shutdown.await;
        info!("shutdown requested");
        if self.is_running() {
            self.stop_watching()?;
        }
        Ok(())
    }

    /// Run until Ctrl+C (or SIGTERM on unix).
    pub async fn run_forever(&mut self) -> Result<(), LifecycleError> {
        self.run_until(shutdown_signal()).await
    }
}

/// Resolves on Ctrl+C, or on SIGTERM where available.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
