//! trellobackup CLI: back up Trello boards to local JSON files.
//!
//! Saves every board the user can see (and optionally their attachments)
//! into a timestamped folder, and turns saved boards into comment transcripts.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
