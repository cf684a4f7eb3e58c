use anyhow::{Context, Result};
use clap::{ArgMatches, Command};

use crate::config::MailkitConfig;

pub fn make_subcommand() -> Command {
    Command::new("clean").about("Remove the output tree")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = MailkitConfig::load(args)?;
    let dist = &config.paths.dist;

    let removed = mailkit_core::clean::clean(dist)
        .with_context(|| format!("Failed to remove {}", dist.display()))?;
    if removed {
        println!("Removed {}", dist.display());
    } else {
        println!("Nothing to clean at {}", dist.display());
    }

    Ok(())
}
