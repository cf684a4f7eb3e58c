use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::EnvFilter;

mod cmd;
mod config;
mod watch;

fn cli() -> Command {
    let root = Command::new("mailkit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build, preview and package HTML email templates")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file [default: ./mailkit.toml]")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("More output; repeat for trace logging")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log warnings and errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .global(true),
        );

    cmd::dev::add_server_args(root)
        .subcommand(cmd::dev::make_subcommand())
        .subcommand(cmd::build::make_subcommand())
        .subcommand(cmd::boilerplate::make_subcommand())
        .subcommand(cmd::zip::make_subcommand())
        .subcommand(cmd::pages::make_subcommand())
        .subcommand(cmd::lint::make_subcommand())
        .subcommand(cmd::clean::make_subcommand())
}

/// `RUST_LOG` wins over the verbosity flags.
fn init_tracing(args: &ArgMatches) {
    let level = if args.get_flag("quiet") {
        "warn"
    } else {
        match args.get_count("verbose") {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("dev", args)) => cmd::dev::execute(args).await,
        Some(("build", args)) => cmd::build::execute(args),
        Some(("boilerplate", args)) => cmd::boilerplate::execute(args),
        Some(("zip", args)) => cmd::zip::execute(args).await,
        Some(("pages", args)) => cmd::pages::execute(args),
        Some(("lint", args)) => cmd::lint::execute(args),
        Some(("clean", args)) => cmd::clean::execute(args),
        _ => cmd::dev::execute(&matches).await,
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(&matches);

    if let Err(e) = run(matches).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn boilerplate_requires_name() {
        let err = cli()
            .try_get_matches_from(["mailkit", "boilerplate"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn no_subcommand_accepts_server_args() {
        let matches = cli()
            .try_get_matches_from(["mailkit", "--port", "4000", "--open"])
            .unwrap();
        assert!(matches.subcommand().is_none());
        assert_eq!(matches.get_one::<u16>("port"), Some(&4000));
        assert!(matches.get_flag("open"));
    }

    #[test]
    fn global_flags_reach_subcommands() {
        let matches = cli()
            .try_get_matches_from(["mailkit", "build", "-vv", "--config", "alt.toml"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_count("verbose"), 2);
        assert_eq!(args.get_one::<String>("config").map(String::as_str), Some("alt.toml"));
    }
}
