// gac CLI entry point.

use std::path::PathBuf;
use std::process;

use clap::Parser;

mod commands;
mod exit_code;
mod output;
mod service;

use exit_code::ExitCode;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "gac", version, about = "Watch folders and automatically commit and push changes")]
struct Cli {
    /// Config file to use instead of $GAC_CONFIG or ~/.gac/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::Usage } else { ExitCode::Success }.into();
        }
    };

    let global = commands::GlobalArgs { config: cli.config };
    match commands::run(cli.command, &global) {
        Ok(()) => ExitCode::Success.into(),
        Err(e) => {
            output::print_anyhow_error(OutputFormat::Human, &e);
            // Usage errors never reach here; argument parsing handles them.
            ExitCode::Error.into()
        }
    }
}
