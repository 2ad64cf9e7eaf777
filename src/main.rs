// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "foodcam")]
#[command(about = "Capture food photos from the command line")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras and show which one would be used
    List,

    /// Take a photo, label it and save it
    Photo {
        /// Prefer the front camera over the rear one
        #[arg(short, long)]
        front: bool,

        /// Display name used for the file (default: classifier label)
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory (default: ~/Pictures/foodcam)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Hide the camera view for a while and report whether the session survived
    Lifecycle {
        /// How long the view stays hidden, in milliseconds
        #[arg(long, default_value = "1000")]
        hidden_ms: u64,

        /// Background the app for this long while the view is hidden
        #[arg(long)]
        background_ms: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=foodcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config();

    match cli.command {
        Commands::List => cli::list_cameras(&config),
        Commands::Photo {
            front,
            name,
            output,
        } => cli::take_photo(config, front, name, output),
        Commands::Lifecycle {
            hidden_ms,
            background_ms,
        } => cli::run_lifecycle(config, hidden_ms, background_ms),
    }
}
