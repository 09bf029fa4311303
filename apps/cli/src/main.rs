//! biddoc: generate bidding documents from structured form data.
//!
//! Entry point for the `biddoc` binary.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    commands::init_tracing(&cli);

    commands::run(cli).await
}
