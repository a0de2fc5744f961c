// `gac add`: register a folder, initializing it as a git repository if needed.

use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::Args;
use gac_common::path::normalize_folder;
use gac_daemon::config::{ConfigError, FolderStore};
use gac_daemon::git::sync::{git_init_and_first_commit, is_git_repo};

use super::GlobalArgs;
use crate::output::{self, OutputFormat};
use crate::service;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Local folder to watch
    pub folder: String,
    /// Remote repository URL
    pub repo_url: String,
    /// Username for the remote
    pub username: String,
    /// Personal access token for the remote
    pub token: String,
    /// Do not install the systemd user service
    #[arg(long)]
    pub no_service: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub struct AddOutcome {
    pub folder: PathBuf,
    /// Message from initializing the repository, when it was not one yet.
    pub initialized: Option<String>,
}

pub fn run(args: AddArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let folder = normalize_folder(&args.folder)?;
    let mut store = FolderStore::open_resolved(global.config.as_deref())?;

    if folder.is_dir() && !is_git_repo(&folder) {
        println!("Folder '{}' is not a git repository. Initializing...", folder.display());
    }
    let outcome = add_folder(&mut store, &folder, &args.repo_url, &args.username, &args.token)?;
    if let Some(message) = &outcome.initialized {
        println!("{message}");
    }
    println!("Successfully registered folder: {}", outcome.folder.display());

    if args.no_service {
        return Ok(());
    }
    match service::install(global.config.as_deref()) {
        Ok(_) => println!(
            "Watcher service enabled: will run in background and auto-start on login."
        ),
        Err(e) => output::print_warning(
            OutputFormat::Human,
            "SERVICE_SETUP_FAILED",
            &format!("Could not set up watcher service: {e:#}"),
        ),
    }
    Ok(())
}

/// Initialize `folder` if it is not a repository yet, then register it.
pub fn add_folder(
    store: &mut FolderStore,
    folder: &Path,
    repo_url: &str,
    username: &str,
    token: &str,
) -> anyhow::Result<AddOutcome> {
    if !folder.is_dir() {
        return Err(ConfigError::NotADirectory(folder.to_path_buf()).into());
    }

    let mut initialized = None;
    if !is_git_repo(folder) {
        let result = git_init_and_first_commit(folder, repo_url, username, token);
        if !result.success {
            bail!(result.message);
        }
        initialized = Some(result.message);
    }

    let folder = store.add_folder(folder, repo_url, username, token)?;
    Ok(AddOutcome { folder, initialized })
}
