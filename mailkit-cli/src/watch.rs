use anyhow::Result;
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use notify::Watcher;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing::{debug, info, warn};

use mailkit_core::{Pipeline, Task, config::PathsConfig};
use mailkit_dev_server::Reloader;

/// Globs relative to the emails directory and the task each one triggers.
const EMAIL_RULES: &[(&[&str], Task)] = &[
    (&["**/*.mjml"], Task::Mjml),
    (&["**/img/*.{png,jpeg,jpg,svg,gif}"], Task::Images),
    (&["**/styles/*.{css,scss}"], Task::Pages),
    (&["**/*.tera", "**/data.json"], Task::Pages),
];

/// Maps changed source files to the tasks that rebuild their outputs.
#[derive(Debug)]
pub struct WatchRules {
    index: PathBuf,
    emails: PathBuf,
    partials: Vec<PathBuf>,
    email_rules: Vec<(GlobSet, Task)>,
}

impl WatchRules {
    pub fn new(index: PathBuf, emails: PathBuf, partials: Vec<PathBuf>) -> Result<Self> {
        let mut email_rules = Vec::with_capacity(EMAIL_RULES.len());
        for (patterns, task) in EMAIL_RULES {
            let mut set = GlobSetBuilder::new();
            for pattern in *patterns {
                set.add(glob(pattern)?);
            }
            email_rules.push((set.build()?, *task));
        }

        Ok(Self {
            index,
            emails,
            partials,
            email_rules,
        })
    }

    /// Rules for a project layout. Roots are made absolute so they line up
    /// with the paths the file watcher reports.
    pub fn from_paths(paths: &PathsConfig) -> Result<Self> {
        Self::new(
            absolute(&paths.index),
            absolute(&paths.emails),
            paths.partials.iter().map(|p| absolute(p)).collect(),
        )
    }

    pub fn tasks_for(&self, path: &Path) -> BTreeSet<Task> {
        let mut tasks = BTreeSet::new();

        if path == self.index {
            tasks.insert(Task::Index);
        }

        if let Ok(relative) = path.strip_prefix(&self.emails) {
            for (set, task) in &self.email_rules {
                if set.is_match(relative) {
                    tasks.insert(*task);
                }
            }
        }

        if self.partials.iter().any(|dir| path.starts_with(dir)) {
            tasks.insert(Task::Pages);
        }

        tasks
    }

    /// Every task triggered by any path in a batch, in pipeline order.
    pub fn tasks_for_batch<'a>(&self, paths: impl IntoIterator<Item = &'a Path>) -> Vec<Task> {
        paths
            .into_iter()
            .flat_map(|path| self.tasks_for(path))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn glob(pattern: &str) -> Result<Glob> {
    Ok(GlobBuilder::new(pattern).literal_separator(true).build()?)
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Watch the source tree and rerun the matching tasks for each batch of
/// changes. The reload fires only after the batch's tasks have returned.
pub async fn watch_sources(
    pipeline: Arc<Pipeline>,
    debounce: Duration,
    reloader: Reloader,
) -> Result<()> {
    let rules = WatchRules::from_paths(pipeline.paths())?;
    let (tx, mut rx) = tokio::sync::mpsc::channel::<Vec<PathBuf>>(100);

    let mut debouncer = new_debouncer(debounce, move |res: DebounceEventResult| match res {
        Ok(events) => {
            let _ = tx.blocking_send(events.into_iter().map(|event| event.path).collect());
        }
        Err(e) => warn!("Watch error: {:?}", e),
    })?;

    debouncer
        .watcher()
        .watch(&rules.emails, notify::RecursiveMode::Recursive)?;
    info!("Watching email templates: {}", rules.emails.display());

    for dir in rules.partials.iter().filter(|dir| dir.is_dir()) {
        debouncer
            .watcher()
            .watch(dir, notify::RecursiveMode::Recursive)?;
        info!("Watching partials: {}", dir.display());
    }

    // Rename-on-save replaces the file, so watch its directory.
    if let Some(dir) = rules.index.parent().filter(|dir| dir.is_dir()) {
        debouncer
            .watcher()
            .watch(dir, notify::RecursiveMode::NonRecursive)?;
        info!("Watching index template: {}", rules.index.display());
    }

    while let Some(paths) = rx.recv().await {
        let tasks = rules.tasks_for_batch(paths.iter().map(PathBuf::as_path));
        if tasks.is_empty() {
            for path in &paths {
                debug!("Ignoring change to {}", path.display());
            }
            continue;
        }

        let names: Vec<String> = tasks.iter().map(Task::to_string).collect();
        info!("Sources changed, running: {}", names.join(", "));

        rebuild_and_reload(Arc::clone(&pipeline), tasks, &reloader).await?;
    }

    Ok(())
}

/// Run `tasks` off the async runtime, then tell browsers to reload.
/// Task failures are logged by the pipeline and still end in a reload.
pub async fn rebuild_and_reload(
    pipeline: Arc<Pipeline>,
    tasks: Vec<Task>,
    reloader: &Reloader,
) -> Result<usize> {
    tokio::task::spawn_blocking(move || {
        for task in tasks {
            let _ = pipeline.run(task);
        }
    })
    .await?;

    Ok(reloader.reload())
}
