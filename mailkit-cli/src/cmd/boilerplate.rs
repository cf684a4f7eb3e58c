use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use mailkit_core::{FolderSet, Pipeline, ScaffoldOptions};

use crate::config::MailkitConfig;

pub fn make_subcommand() -> Command {
    Command::new("boilerplate")
        .about("Create a new email template from the boilerplate skeleton")
        .arg(
            Arg::new("name")
                .short('n')
                .long("name")
                .value_name("NAME")
                .help("Name of the new template folder")
                .required(true),
        )
        .arg(
            Arg::new("force")
                .short('f')
                .long("force")
                .help("Overwrite an existing template with the same name")
                .action(ArgAction::SetTrue),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = MailkitConfig::load(args)?;
    // The emails directory may not exist yet, so skip discovery.
    let pipeline = Pipeline::builder()
        .config(config.pipeline())
        .folders(FolderSet::default())
        .build()?;

    let name = args.get_one::<String>("name").cloned().unwrap_or_default();
    let options = ScaffoldOptions {
        name,
        force: args.get_flag("force"),
    };

    let created = pipeline.scaffold(&options)?;
    println!("Created template {} at {}", options.name, created.display());

    Ok(())
}
