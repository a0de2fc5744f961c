// `gac remove`: stop tracking a folder.

use std::path::Path;

use clap::Args;
use gac_daemon::config::FolderStore;

use super::GlobalArgs;

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Registered folder to remove
    pub folder: String,
}

pub fn run(args: RemoveArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let mut store = FolderStore::open_resolved(global.config.as_deref())?;
    store.remove_folder(Path::new(&args.folder))?;
    println!("Removed folder: {}", args.folder);
    println!("A running watcher picks this up on its next start.");
    Ok(())
}
