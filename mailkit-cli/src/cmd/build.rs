use anyhow::Result;
use clap::{ArgMatches, Command};

use super::load_pipeline;
use crate::config::MailkitConfig;

pub fn make_subcommand() -> Command {
    Command::new("build").about("Clean the output tree and build every email template")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = MailkitConfig::load(args)?;
    let pipeline = load_pipeline(&config)?;

    pipeline.build()?;

    println!(
        "Built {} email templates in {}",
        pipeline.folders().len(),
        pipeline.paths().dist.display()
    );

    Ok(())
}
