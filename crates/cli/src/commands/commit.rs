// `gac commit`: commit and push the current folder immediately.

use std::path::Path;

use anyhow::bail;
use clap::Args;
use gac_common::types::CommitResult;
use gac_daemon::config::{ConfigError, FolderStore};
use gac_daemon::git::sync::commit_and_push;

use super::GlobalArgs;

#[derive(Debug, Args)]
pub struct CommitArgs {
    /// Commit message (defaults to the configured auto-commit message)
    #[arg(long, short)]
    pub message: Option<String>,
}

pub fn run(args: CommitArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let store = FolderStore::open_resolved(global.config.as_deref())?;
    let cwd = std::env::current_dir()?;

    println!("Committing changes in {}...", cwd.display());
    let result = commit_folder(&store, &cwd, args.message.as_deref())?;
    if !result.success {
        bail!(result.message);
    }
    println!("Success: {}", result.message);
    Ok(())
}

/// Commit `folder` with its registered credentials.
pub fn commit_folder(
    store: &FolderStore,
    folder: &Path,
    message: Option<&str>,
) -> Result<CommitResult, ConfigError> {
    let config = store
        .get_folder_config(folder)
        .ok_or_else(|| ConfigError::NotRegistered(folder.to_path_buf()))?;
    let message = message.unwrap_or(&store.settings().commit_message);
    Ok(commit_and_push(folder, config, message))
}
