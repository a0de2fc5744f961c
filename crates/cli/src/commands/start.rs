// `gac start`: watch every registered folder until interrupted.

use clap::Args;
use gac_daemon::config::FolderStore;
use gac_daemon::controller::{shutdown_signal, LifecycleError, WatcherController};
use tracing::warn;

use super::GlobalArgs;

#[derive(Debug, Args)]
pub struct StartArgs {}

pub fn run(_args: StartArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let store = FolderStore::open_resolved(global.config.as_deref())?;
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let mut controller = WatcherController::from_store(store, runtime.handle().clone());

    println!("Starting Git Auto Commit watcher for all registered folders...");
    runtime.block_on(watch(&mut controller))
}

async fn watch(controller: &mut WatcherController) -> anyhow::Result<()> {
    match controller.run_forever().await {
        Ok(()) => println!("\nWatcher stopped."),
        // Idle instead of exiting so a service manager does not restart-loop.
        Err(e @ (LifecycleError::NoFolders | LifecycleError::NoWatchesStarted)) => {
            warn!(error = %e, "nothing to watch, waiting for shutdown");
            println!("Watcher could not start ({e}). Waiting...");
            shutdown_signal().await;
            println!("\nExiting watcher.");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
