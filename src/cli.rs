use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "sitelog")]
#[command(about = "Replay field report wizard events and submit the result", long_about = None)]
pub struct Cli {
    /// Replay script (JSON)
    #[arg(required = true)]
    pub script: PathBuf,

    /// Print the payload instead of sending it to the backend
    #[arg(long)]
    pub dry_run: bool,

    /// Config file (default: <config_dir>/sitelog/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the replay report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
