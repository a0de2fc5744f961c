// `gac gui`: the graphical front-end is not part of this build.

use anyhow::bail;
use clap::Args;

use super::GlobalArgs;

#[derive(Debug, Args)]
pub struct GuiArgs {}

pub fn run(_args: GuiArgs, _global: &GlobalArgs) -> anyhow::Result<()> {
    bail!("The graphical interface is not available. Use `gac add`, `gac list` and `gac start` instead")
}
