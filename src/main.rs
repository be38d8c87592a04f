use clap::Parser;
use sc_extractor::cli::Cli;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the JSON output, logs go to stderr
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting sc-extractor v{}", env!("CARGO_PKG_VERSION"));

    cli.run().await?;

    Ok(())
}
