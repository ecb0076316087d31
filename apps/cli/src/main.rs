//! newsbrief CLI: a daily AI news briefing in one command.
//!
//! Reads article links from a spreadsheet, fetches and condenses each page,
//! has a local language model write the briefing, and mails it.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // A missing .env is fine; the variables may come from the environment.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
