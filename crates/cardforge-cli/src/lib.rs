//! cardforge CLI - argument surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod cmd;

#[derive(Debug, Parser)]
#[command(name = "cardforge", version, about = "Character card PNG tooling")]
pub struct Cli {
    /// Path to a TOML config file (defaults + CARDFORGE_* env otherwise)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the card embedded in a PNG
    Inspect {
        file: PathBuf,
        /// Include a token-count breakdown
        #[arg(long)]
        tokens: bool,
    },
    /// Extract the card JSON from a PNG (or normalize a JSON card to V3)
    Extract {
        file: PathBuf,
        /// Output path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Embed a card JSON into a PNG
    Embed {
        /// Base image
        image: PathBuf,
        /// Card file (V2 or V3 JSON, or another card PNG)
        card: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Skip the legacy `chara` compatibility chunk
        #[arg(long)]
        no_v2_compat: bool,
    },
    /// Remove card chunks from a PNG
    Strip {
        file: PathBuf,
        /// Keyword to remove; both `ccv3` and `chara` when omitted
        #[arg(long)]
        keyword: Option<String>,
        /// Output path; overwrites the input when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a URL against the egress policy
    CheckUrl {
        url: String,
        /// Permit localhost destinations for this check
        #[arg(long)]
        allow_localhost: bool,
    },
    /// List models from an OpenAI-compatible endpoint
    Models {
        #[arg(long)]
        base_url: String,
        #[arg(long, env = "CARDFORGE_API_KEY", hide_env_values = true)]
        api_key: String,
    },
}
