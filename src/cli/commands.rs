//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GeoCore record to Parquet converter
#[derive(Parser, Debug)]
#[command(name = "geocore-parquet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Source bucket URL, overrides the config file
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Destination bucket URL, overrides the config file
    #[arg(long, global = true)]
    pub destination: Option<String>,

    /// Records per batch, overrides the config file
    #[arg(long, global = true)]
    pub batch_size: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one conversion pass and print the response
    Run {
        /// Trigger event file (JSON)
        #[arg(long)]
        event: Option<PathBuf>,

        /// Inline trigger event JSON
        #[arg(long)]
        event_json: Option<String>,
    },

    /// Print the keys a pass would read
    List {
        /// Maximum keys to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Validate the configuration
    Validate,

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}
