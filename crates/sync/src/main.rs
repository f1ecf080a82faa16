//! schedsync sync binary
//!
//! Syncs the public calendar feed into the schedule document the static
//! site consumes. Exit code is non-zero only for fatal fetch/parse/write
//! failures; data-quality problems are warnings in the document.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Sync the calendar feed into the site's schedule document
#[derive(Debug, Parser)]
#[command(name = "sync", version, about)]
struct Cli {
    /// Read the ICS feed from a local file instead of fetching it
    #[arg(long, value_name = "FILE")]
    ics: Option<PathBuf>,

    /// Override the ICS feed URL
    #[arg(long, value_name = "URL")]
    ics_url: Option<Url>,

    /// Where to write the schedule document
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = sync::Config::from_env()?;
    if let Some(path) = cli.ics {
        config.ics_file = Some(path);
    }
    if let Some(url) = cli.ics_url {
        config.ics_url = Some(url);
    }
    if let Some(output) = cli.output {
        config.output = output;
    }

    let summary = sync::run(config).await?;
    info!(
        "Sync complete: {} upcoming entries, {} warnings",
        summary.upcoming, summary.warnings
    );

    Ok(())
}
