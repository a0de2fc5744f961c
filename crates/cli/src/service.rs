// systemd user service that runs `gac start` on login.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, bail, Context};
use tracing::{debug, info};

pub const SERVICE_NAME: &str = "gac-watcher.service";

/// Install (or refresh) the unit file, then enable the service and restart it
/// so newly added folders are picked up. Returns the unit path.
pub fn install(config: Option<&Path>) -> anyhow::Result<PathBuf> {
    let unit_dir = unit_dir().ok_or_else(|| anyhow!("could not determine the user config directory"))?;
    let exe = std::env::current_exe().context("failed to locate the gac executable")?;
    let unit = render_unit(&exe, config);

    let path = write_unit(&unit_dir, &unit)?;
    systemctl(&["daemon-reload"])?;
    systemctl(&["enable", SERVICE_NAME])?;
    systemctl(&["restart", SERVICE_NAME])?;
    info!(unit = %path.display(), "watcher service enabled");
    Ok(path)
}

fn unit_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("systemd").join("user"))
}

pub fn render_unit(exe: &Path, config: Option<&Path>) -> String {
    let mut exec_start = format!("{} start", quote(&exe.display().to_string()));
    if let Some(config) = config {
        exec_start.push_str(&format!(" --config {}", quote(&config.display().to_string())));
    }
    format!(
        "[Unit]\n\
         Description=Git Auto Commit Watcher\n\
         \n\
         [Service]\n\
         ExecStart={exec_start}\n\
         Restart=always\n\
         \n\
         [Install]\n\
         WantedBy=default.target\n"
    )
}

/// Write the unit into `dir`, skipping the write when it is unchanged.
pub fn write_unit(dir: &Path, contents: &str) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create `{}`", dir.display()))?;
    let path = dir.join(SERVICE_NAME);
    if fs::read_to_string(&path).is_ok_and(|existing| existing == contents) {
        debug!(unit = %path.display(), "unit file up to date");
        return Ok(path);
    }
    fs::write(&path, contents).with_context(|| format!("failed to write `{}`", path.display()))?;
    Ok(path)
}

fn systemctl(args: &[&str]) -> anyhow::Result<()> {
    let output = Command::new("systemctl")
        .arg("--user")
        .args(args)
        .output()
        .context("failed to run systemctl")?;
    if !output.status.success() {
        bail!(
            "`systemctl --user {}` failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

/// systemd splits ExecStart on whitespace; quote paths that contain it.
fn quote(value: &str) -> String {
    if value.contains(char::is_whitespace) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
