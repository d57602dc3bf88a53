use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;
mod commands;
mod config;
mod manifest;
mod memory;

use cli::{Cli, Commands};

fn init_logging(log_level: Option<&str>, log_file: Option<&std::path::Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))?;

    match log_file {
        Some(path) => {
            let file = Arc::new(File::create(path)?);
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Operations(args) => {
            let run_config = match config::load_config(args.config.as_deref()) {
                Ok(c) => c,
                Err(err) => {
                    eprintln!("Error: {err:#}");
                    return ExitCode::FAILURE;
                }
            };

            if let Err(err) = init_logging(
                run_config.solving.log_level.as_deref(),
                args.log_file.as_deref(),
            ) {
                eprintln!("Error: failed to initialize logging: {err:#}");
                return ExitCode::FAILURE;
            }

            if let Err(err) = commands::operations::handle(args, &run_config) {
                error!("operations step failed: {err:#}");
                eprintln!("Error: {err:#}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
