// jornada - production shift tracking client

use clap::Parser;
use jornada::cli;
use jornada::error::Result;
use std::fs::OpenOptions;
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first to get verbose flag
    let args = cli::Cli::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let log_file = if args.command.is_long_running() {
        open_log_file()
    } else {
        None
    };

    match log_file {
        Some(file) => {
            // Keep the terminal for session warnings while watching
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(log_level.into()),
                )
                .with_writer(file.with_max_level(tracing::Level::TRACE))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(log_level.into()),
                )
                .with_writer(std::io::stderr)
                .init();
        }
    }

    cli::execute(args).await
}

fn open_log_file() -> Option<std::fs::File> {
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("/tmp"))
        .join("jornada");

    let _ = std::fs::create_dir_all(&log_dir);

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("jornada.log"))
        .ok()
}
