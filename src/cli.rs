use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "livesim")]
#[command(author, version, about = "Live HLS playlist simulator with fault injection")]
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
    /// Start the simulator HTTP server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the live window of a source manifest without starting a server
    Render {
        /// Source manifest (.m3u8)
        #[arg(required = true)]
        manifest: PathBuf,

        /// Seconds elapsed since the track started
        #[arg(long, default_value = "0")]
        elapsed: f64,

        /// Render the window as stopped at the elapsed time
        #[arg(long)]
        stopped: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
