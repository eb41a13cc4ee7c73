use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "introskip")]
#[command(author, version, about = "HLS proxy that skips or splices out video intros")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HLS manifest server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Resolve a single request and print the manifest or redirect target
    Resolve {
        /// Source video URL
        #[arg(required = true)]
        url: String,

        /// Intro start in seconds
        #[arg(long, default_value_t = 0.0)]
        start: f64,

        /// Intro end in seconds
        #[arg(long, default_value_t = 0.0)]
        end: f64,
    },

    /// Probe a remote source for its final URL and length
    Probe {
        /// Source video URL
        #[arg(required = true)]
        url: String,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
