pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gameshelf")]
#[command(about = "Fetch and watch a remote game catalog", long_about = None)]
pub struct Cli {
    /// Manifest URL to use instead of the configured one
    #[arg(long, global = true)]
    pub manifest_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a single URL and report the outcome
    Fetch {
        /// URL to download
        url: String,
    },
    /// Refresh the catalog once and list its entries
    List {
        /// Print the manifest as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Keep refreshing the catalog in the foreground
    Watch {
        /// Refresh interval (e.g., "30m", "1h", "1d"); defaults to the configured one
        #[arg(short, long)]
        interval: Option<String>,

        /// Skip the refresh on start
        #[arg(long)]
        no_initial_refresh: bool,
    },
}
