// CLI subcommand dispatch.

use std::path::PathBuf;

use clap::Subcommand;

pub mod add;
pub mod commit;
pub mod gui;
pub mod list;
pub mod remove;
pub mod start;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a folder for automatic commits
    Add(add::AddArgs),
    /// List registered folders
    List(list::ListArgs),
    /// Commit and push the current folder now
    Commit(commit::CommitArgs),
    /// Watch all registered folders until interrupted
    Start(start::StartArgs),
    /// Unregister a folder
    Remove(remove::RemoveArgs),
    /// Launch the graphical interface
    Gui(gui::GuiArgs),
}

pub fn run(cmd: Command, global: &GlobalArgs) -> anyhow::Result<()> {
    match cmd {
        Command::Add(args) => add::run(args, global),
        Command::List(args) => list::run(args, global),
        Command::Commit(args) => commit::run(args, global),
        Command::Start(args) => start::run(args, global),
        Command::Remove(args) => remove::run(args, global),
        Command::Gui(args) => gui::run(args, global),
    }
}
