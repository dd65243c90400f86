use clap::{Parser, Subcommand};
use snap_merge_core::Backend;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "snap-merge", version)]
#[command(about = "Pair screenshots by creation time and stamp one onto the other", long_about = None)]
pub struct Cli {
    /// Work directory path (defaults to ~/Downloads)
    #[arg(short = 'd', long)]
    pub work_dir: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Interface language
    #[arg(short, long, value_parser = ["zh", "en", "auto"])]
    pub lang: Option<String>,

    /// Configuration file (./Config.toml is used when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Image backend: magick or native
    #[arg(long)]
    pub backend: Option<Backend>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum Commands {
    /// Process the work directory once (the default)
    Run,
    /// Print configuration values
    PrintConfig,
}
