use anyhow::Result;
use clap::Parser;

mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    cli::run(cli::Cli::parse()).await
}
