mod cli;
mod families;
mod loader;
mod model;
mod storage;
mod table;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
mod view;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log output goes.
#[derive(Debug, PartialEq)]
enum LogSink {
    Stderr,
    /// The TUI owns the terminal, so its logs go to a file.
    File(PathBuf),
}

fn log_sink(args: &cli::Cli) -> LogSink {
    if args.is_interactive() && cfg!(feature = "tui") {
        LogSink::File(storage::log_file_path())
    } else {
        LogSink::Stderr
    }
}

/// The TUI only logs when asked to.
fn init_logging(args: &cli::Cli) -> Result<()> {
    let default = if args.is_interactive() { "off" } else { "warn" };
    let filter = match args.log_level.as_deref() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let _ = match log_sink(args) {
        LogSink::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogSink::File(path) => {
            // Nothing is written unless a filter was set, so skip creating the file.
            if args.log_level.is_none() && std::env::var_os("RUST_LOG").is_none() {
                return Ok(());
            }
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("create log directory {}", dir.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = !args.is_interactive();
    init_logging(&args)?;

    cli::run(args).await?;
    // Explicitly exit with code 0 on success in non-TUI modes
    if is_non_tui {
        std::process::exit(0);
    }
    Ok(())
}
