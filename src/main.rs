use anyhow::Result;
use clap::Parser;
use mkv_tracks_swapper::{cli::Cli, run};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
