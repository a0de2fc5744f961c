// Output format selection and stderr diagnostics for the CLI.
//
// `--json` forces JSON; otherwise TTY → human text, piped → JSON.

use std::io::{self, IsTerminal, Write};

use gac_daemon::config::ConfigError;
use gac_daemon::controller::LifecycleError;
use serde::Serialize;

const ANSI_RED: &str = "\x1b[31m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    /// JSON if `--json` was passed or stdout is not a TTY.
    pub fn detect(json_flag: bool) -> Self {
        if json_flag {
            return Self::Json;
        }
        Self::detect_from_terminal(io::stdout().is_terminal())
    }

    pub fn detect_from_terminal(is_tty: bool) -> Self {
        if is_tty {
            Self::Human
        } else {
            Self::Json
        }
    }
}

/// Write a value to stdout in the selected format.
pub fn print_output<T, F>(format: OutputFormat, value: &T, human_fn: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    let mut out = io::stdout().lock();
    write_output(&mut out, format, value, human_fn)
}

/// Write a value to a provided writer.
pub fn write_output<W, T, F>(
    writer: &mut W,
    format: OutputFormat,
    value: &T,
    human_fn: F,
) -> io::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Human => {
            writeln!(writer, "{}", human_fn(value))
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, value).map_err(io::Error::other)?;
            writeln!(writer)
        }
    }
}

pub fn print_error(format: OutputFormat, code: &str, message: &str) {
    print_diagnostic(format, "error", ANSI_RED, code, message);
}

pub fn print_warning(format: OutputFormat, code: &str, message: &str) {
    print_diagnostic(format, "warning", ANSI_YELLOW, code, message);
}

fn print_diagnostic(format: OutputFormat, label: &str, color: &str, code: &str, message: &str) {
    let mut err = io::stderr().lock();
    match format {
        OutputFormat::Human => {
            let line = render_human_stderr_line(label, message, io::stderr().is_terminal(), color);
            let _ = writeln!(err, "{line}");
        }
        OutputFormat::Json => {
            let mut obj = serde_json::Map::new();
            obj.insert(label.to_string(), serde_json::json!({ "code": code, "message": message }));
            let _ = serde_json::to_writer(&mut err, &obj);
            let _ = writeln!(err);
        }
    }
}

/// Print a command failure with a hint for the errors users can act on.
pub fn print_anyhow_error(format: OutputFormat, error: &anyhow::Error) {
    let (code, message) = actionable_error(error);
    print_error(format, code, &message);
}

fn actionable_error(error: &anyhow::Error) -> (&'static str, String) {
    let message = format!("{error:#}");

    for cause in error.chain() {
        if let Some(config_error) = cause.downcast_ref::<ConfigError>() {
            return match config_error {
                ConfigError::NotRegistered(folder) => (
                    "NOT_REGISTERED",
                    format!(
                        "Folder {} is not registered. Run: gac add <folder> <repo_url> <username> <token>",
                        folder.display()
                    ),
                ),
                ConfigError::NotADirectory(folder) => {
                    ("FOLDER_NOT_FOUND", format!("Folder {} does not exist", folder.display()))
                }
                ConfigError::Parse(_) => (
                    "CONFIG_INVALID",
                    format!("{message}. Fix or remove the config file and try again"),
                ),
                ConfigError::NoHomeDir => (
                    "CONFIG_NOT_FOUND",
                    "Could not locate a home directory. Pass --config <path> or set GAC_CONFIG"
                        .to_string(),
                ),
                _ => ("CONFIG_ERROR", message),
            };
        }
        if let Some(LifecycleError::NoFolders) = cause.downcast_ref::<LifecycleError>() {
            return (
                "NO_FOLDERS",
                "No folders are registered. Run: gac add <folder> <repo_url> <username> <token>"
                    .to_string(),
            );
        }
    }

    if message.starts_with("Failed to ") {
        return ("GIT_FAILED", message);
    }

    ("ERROR", message)
}

fn render_human_stderr_line(label: &str, message: &str, is_tty: bool, color: &str) -> String {
    if is_tty {
        format!("{color}{label}:{ANSI_RESET} {message}")
    } else {
        format!("{label}: {message}")
    }
}
