use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, value_parser};
use std::{sync::Arc, time::Duration};
use tracing::error;

use mailkit_dev_server::{LiveServer, LiveServerConfig};

use super::load_pipeline;
use crate::config::MailkitConfig;
use crate::watch::watch_sources;

pub fn add_server_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to serve on [default: 3000]")
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Host to bind to [default: 127.0.0.1]"),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open browser automatically")
                .action(clap::ArgAction::SetTrue),
        )
}

pub fn make_subcommand() -> Command {
    add_server_args(Command::new("dev"))
        .about("Build, serve with live reload and rebuild on changes (default)")
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    // Load cascading configuration
    let config = MailkitConfig::load(args)?;
    let pipeline = Arc::new(load_pipeline(&config)?);
    let dist = pipeline.paths().dist.clone();

    // A broken template should not keep the preview from starting
    let initial = Arc::clone(&pipeline);
    if let Err(e) = tokio::task::spawn_blocking(move || initial.prepare_dev()).await? {
        error!("Initial build failed: {}", e);
    }
    std::fs::create_dir_all(&dist)
        .with_context(|| format!("Failed to create {}", dist.display()))?;

    let server = LiveServer::new(LiveServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        root: dist,
        open: config.server.open,
    });
    let reloader = server.reloader();

    let mut server_handle = tokio::spawn(server.run());

    // Watch source files, rebuild, then reload connected browsers
    let debounce = Duration::from_millis(config.watch.debounce_ms);
    let mut watcher_handle = tokio::spawn(watch_sources(pipeline, debounce, reloader));

    // Either task ending stops the other; its error becomes the exit status
    tokio::select! {
        result = &mut server_handle => {
            watcher_handle.abort();
            result?.context("Dev server stopped")?;
        }
        result = &mut watcher_handle => {
            server_handle.abort();
            result?.context("Source watcher stopped")?;
        }
    }

    Ok(())
}
