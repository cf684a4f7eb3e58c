use anyhow::Result;
use clap::{ArgMatches, Command};

use super::load_pipeline;
use crate::config::MailkitConfig;

pub fn make_subcommand() -> Command {
    Command::new("zip").about("Zip each built template into its own archive")
}

/// Archive failures are logged per template and never fail the command.
pub async fn execute(args: &ArgMatches) -> Result<()> {
    let config = MailkitConfig::load(args)?;
    let pipeline = load_pipeline(&config)?;

    let report = pipeline.zip().await;
    for archive in &report.created {
        println!("Created {}", archive.display());
    }
    if !report.failed.is_empty() {
        println!("{} archives could not be created", report.failed.len());
    }

    Ok(())
}
