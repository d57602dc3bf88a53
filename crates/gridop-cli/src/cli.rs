use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridop", author, version, about = "Operations re-dispatch pipeline for capacity-planned networks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Re-dispatch a network against capacities fixed by a planning run
    Operations(OperationsArgs),
}

#[derive(Args, Debug)]
pub struct OperationsArgs {
    /// Base-case network file (capacities still extendable)
    #[arg(long)]
    pub unprepared: PathBuf,

    /// Solved capacity-expansion network file
    #[arg(long)]
    pub optimized: PathBuf,

    /// Where to write the solved operations network
    #[arg(long)]
    pub out: PathBuf,

    /// TOML run configuration ([solving] table)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write log output to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
