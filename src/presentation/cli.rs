use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::EngineId;
use crate::presentation::config::Environment;

#[derive(Debug, Parser)]
#[command(name = "speechgate", version, about = "Speech-to-text with engine fallback")]
pub struct Cli {
    /// Directory holding appsettings.toml and its environment layers.
    #[arg(long, default_value = ".")]
    pub config_dir: PathBuf,

    /// Overrides APP_ENVIRONMENT.
    #[arg(long)]
    pub environment: Option<Environment>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List registered engines in priority order.
    Engines,
    /// Query the availability of every registered engine.
    Status,
    /// Transcribe an audio file with the best available engine.
    Transcribe {
        file: PathBuf,
        /// Engine to try first.
        #[arg(long)]
        engine: Option<EngineId>,
        /// Language hint such as en-US.
        #[arg(long)]
        language: Option<String>,
    },
}
