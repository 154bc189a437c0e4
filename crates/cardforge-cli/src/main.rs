//! cardforge - character card PNG tooling CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cardforge_cli::cmd;
use cardforge_cli::{Cli, Commands};
use cardforge_core::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { file, tokens } => cmd::inspect::inspect(&file, tokens),
        Commands::Extract { file, output } => cmd::extract::extract(&file, output.as_deref()),
        Commands::Embed {
            image,
            card,
            output,
            no_v2_compat,
        } => cmd::embed::embed(&image, &card, &output, no_v2_compat),
        Commands::Strip {
            file,
            keyword,
            output,
        } => cmd::strip::strip(&file, keyword.as_deref(), output.as_deref()),
        Commands::CheckUrl {
            url,
            allow_localhost,
        } => cmd::check_url::check_url(&settings, &url, allow_localhost).await,
        Commands::Models { base_url, api_key } => {
            cmd::models::models(&settings, &base_url, &api_key).await
        }
    }
}
