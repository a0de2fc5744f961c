// `gac list`: show registered folders.

use clap::Args;
use gac_daemon::config::FolderStore;
use serde::{Deserialize, Serialize};

use super::GlobalArgs;
use crate::output::{self, OutputFormat};

const MASKED_TOKEN: &str = "********";

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResult {
    pub config_path: String,
    #[serde(default)]
    pub folders: Vec<FolderEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderEntry {
    pub folder: String,
    pub repo_url: String,
    pub username: String,
    /// Always masked.
    pub token: String,
    pub auto_commit: bool,
}

pub fn run(args: ListArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let store = FolderStore::open_resolved(global.config.as_deref())?;
    output::print_output(format, &list_result(&store), format_human)?;
    Ok(())
}

pub fn list_result(store: &FolderStore) -> ListResult {
    ListResult {
        config_path: store.path().display().to_string(),
        folders: store
            .get_folders()
            .iter()
            .map(|(folder, cfg)| FolderEntry {
                folder: folder.clone(),
                repo_url: cfg.repo_url.clone(),
                username: cfg.username.clone(),
                token: MASKED_TOKEN.to_string(),
                auto_commit: cfg.auto_commit,
            })
            .collect(),
    }
}

fn format_human(result: &ListResult) -> String {
    if result.folders.is_empty() {
        return "No folders registered for auto-commit".into();
    }

    let mut lines = Vec::new();
    lines.push(format!("Registered folders ({}):", result.folders.len()));
    for f in &result.folders {
        lines.push(format!("  - {}", f.folder));
        lines.push(format!("    Repository: {}", f.repo_url));
        lines.push(format!("    Username: {}", f.username));
        lines.push(format!("    Token: {}", f.token));
        if !f.auto_commit {
            lines.push("    Auto-commit: off".to_string());
        }
    }
    lines.join("\n")
}
