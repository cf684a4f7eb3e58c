use anyhow::Result;
use clap::{ArgMatches, Command};

use super::load_pipeline;
use crate::config::MailkitConfig;

pub fn make_subcommand() -> Command {
    Command::new("pages")
        .about("Render each template's page with its data and inline its styles")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = MailkitConfig::load(args)?;
    let pipeline = load_pipeline(&config)?;

    let rendered = pipeline.pages()?;
    for (name, output) in rendered {
        if let Some(output) = output {
            println!("{name}: {}", output.display());
        }
    }

    Ok(())
}
