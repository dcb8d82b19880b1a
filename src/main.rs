//! Sound Realty - Main Entry Point
//!
//! Trains the house price model and serves predictions over HTTP.

use clap::Parser;
use sound_realty::cli::{cmd_recommend_features, cmd_serve, cmd_train, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sound_realty=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => {
            cmd_train(&args)?;
        }
        Commands::Serve { port, host, model_dir, demographics } => {
            cmd_serve(host, port, model_dir, demographics).await?;
        }
        Commands::RecommendFeatures { sales, future, output } => {
            cmd_recommend_features(sales, future, output)?;
        }
    }

    Ok(())
}
