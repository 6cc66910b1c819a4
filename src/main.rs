use anyhow::Context;
use ais_trip_processor::cli::{run, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).await.context("ais-trips failed")
}
