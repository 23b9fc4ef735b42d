mod config;
mod init_cmd;
mod run_cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use uarwatch_core::{LogCategory, LogLevel};
use uarwatch_logging::{init_logger, LogFilter};

#[derive(Parser)]
#[command(name = "uarwatch")]
#[command(about = "uarwatch: audit logging pipeline for the UAR dashboard")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay NDJSON environment events from stdin and print log stats
    Run {
        /// Config file (defaults to ~/.uarwatch/uarwatch.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the collected entries as a JSON array to this file
        #[arg(short, long)]
        export: Option<PathBuf>,
        /// Also print entries at this level
        #[arg(long)]
        level: Option<LogLevel>,
        /// Also print entries in this category
        #[arg(long)]
        category: Option<LogCategory>,
        /// Also print entries whose action or details contain this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Write a config file populated with defaults
    InitConfig {
        #[arg(short, long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            export,
            level,
            category,
            search,
        } => {
            let filter = LogFilter {
                level,
                category,
                search,
                ..LogFilter::default()
            };
            run_cmd::run(config, export, filter).await?;
        }
        Commands::InitConfig { path, force } => {
            init_logger(None::<PathBuf>, "info");
            let written = init_cmd::run(path, force).await?;
            println!("Wrote {}", written.display());
        }
    }

    Ok(())
}
