use anyhow::Result;
use clap::{ArgMatches, Command};
use mailkit_core::PipelineError;

use super::load_pipeline;
use crate::config::MailkitConfig;

pub fn make_subcommand() -> Command {
    Command::new("lint").about("Check page templates and stylesheets")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = MailkitConfig::load(args)?;
    let pipeline = load_pipeline(&config)?;

    match pipeline.lint() {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(PipelineError::LintFailed(report)) => {
            println!("{report}");
            Err(PipelineError::LintFailed(report).into())
        }
        Err(e) => Err(e.into()),
    }
}
