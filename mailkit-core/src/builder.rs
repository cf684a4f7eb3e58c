use std::fmt;
use std::path::PathBuf;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::archive::{ArchiveReport, archive_all};
use crate::config::{LintOptions, PathsConfig, PipelineConfig};
use crate::folder::{FolderSet, TemplateFolder};
use crate::lint::{LintError, LintReport, lint_folder};
use crate::scaffold::{ScaffoldError, ScaffoldOptions, scaffold};
use crate::scanner::{FolderScanner, ScanError};
use crate::template::{TemplateError, TemplateRenderer};
use crate::{clean, images, index, mjml, page};

/// The units of work a pipeline can run. The watcher maps file changes to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {
    Clean,
    Index,
    Images,
    Mjml,
    Pages,
    Lint,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Task::Clean => "clean",
            Task::Index => "index",
            Task::Images => "images",
            Task::Mjml => "mjml",
            Task::Pages => "pages",
            Task::Lint => "lint",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct FolderFailure {
    pub folder: String,
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

impl fmt::Display for FolderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.folder, self.error)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Scaffold(#[from] ScaffoldError),
    #[error(transparent)]
    Lint(#[from] LintError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{task} failed for {} of {total} folders:\n{}", .failures.len(), list(.failures))]
    Folders {
        task: Task,
        total: usize,
        failures: Vec<FolderFailure>,
    },
    #[error("Lint found {} errors", .0.error_count())]
    LintFailed(LintReport),
}

fn list(failures: &[FolderFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("  {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    folders: Option<FolderSet>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn paths(mut self, paths: PathsConfig) -> Self {
        self.config.paths = paths;
        self
    }

    pub fn lint(mut self, options: LintOptions) -> Self {
        self.config.lint = options;
        self
    }

    /// Use an already discovered folder set instead of scanning.
    pub fn folders(mut self, folders: FolderSet) -> Self {
        self.folders = Some(folders);
        self
    }

    /// Discover the template folders (unless given) and freeze the pipeline.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let folders = match self.folders {
            Some(folders) => folders,
            None => FolderScanner::new(&self.config.paths.emails).scan()?,
        };
        info!("Found {} email templates", folders.len());

        Ok(Pipeline {
            config: self.config,
            folders,
        })
    }
}

/// Every task, bound to one project layout and one folder set.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    folders: FolderSet,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn folders(&self) -> &FolderSet {
        &self.folders
    }

    pub fn paths(&self) -> &PathsConfig {
        &self.config.paths
    }

    /// clean, index, images, mjml
    pub fn build(&self) -> Result<(), PipelineError> {
        self.run_all(&[Task::Clean, Task::Index, Task::Images, Task::Mjml])
    }

    /// index, images, mjml; what the dev server starts from.
    pub fn prepare_dev(&self) -> Result<(), PipelineError> {
        self.run_all(&[Task::Index, Task::Images, Task::Mjml])
    }

    /// Run tasks in order, stopping at the first failure.
    pub fn run_all(&self, tasks: &[Task]) -> Result<(), PipelineError> {
        tasks.iter().try_for_each(|task| self.run(*task))
    }

    pub fn run(&self, task: Task) -> Result<(), PipelineError> {
        info!("Starting {} task", task);
        let result = match task {
            Task::Clean => self.clean(),
            Task::Index => self.index().map(|_| ()),
            Task::Images => self.images().map(|_| ()),
            Task::Mjml => self.mjml().map(|_| ()),
            Task::Pages => self.pages().map(|_| ()),
            Task::Lint => self.lint().map(|_| ()),
        };
        match &result {
            Ok(()) => info!("Finished {} task", task),
            Err(err) => error!("{} task failed: {}", task, err),
        }
        result
    }

    pub fn clean(&self) -> Result<(), PipelineError> {
        clean::clean(&self.config.paths.dist)?;
        Ok(())
    }

    pub fn index(&self) -> Result<PathBuf, PipelineError> {
        let paths = &self.config.paths;
        Ok(index::build_index(
            &self.renderer()?,
            &paths.index,
            &self.folders,
            &paths.dist,
        )?)
    }

    /// Returns the number of images written per folder.
    pub fn images(&self) -> Result<Vec<(String, usize)>, PipelineError> {
        let options = &self.config.images;
        self.for_each_folder(Task::Images, |folder| images::copy_images(folder, options))
    }

    /// Returns the compiled file per folder; `None` where there was no MJML.
    pub fn mjml(&self) -> Result<Vec<(String, Option<PathBuf>)>, PipelineError> {
        let options = &self.config.mjml;
        self.for_each_folder(Task::Mjml, |folder| mjml::compile_folder(folder, options))
    }

    /// Returns the rendered page per folder; `None` where there was no template.
    pub fn pages(&self) -> Result<Vec<(String, Option<PathBuf>)>, PipelineError> {
        let renderer = self.renderer()?;
        let options = &self.config.inline;
        self.for_each_folder(Task::Pages, |folder| {
            page::compile_page(folder, &renderer, options)
        })
    }

    /// Lint every folder. Errors fail the task when `fail_after_error` is set.
    pub fn lint(&self) -> Result<LintReport, PipelineError> {
        let renderer = self.renderer()?;
        let mut report = LintReport::default();
        for folder in self.folders.folders(&self.config.paths) {
            report.extend(lint_folder(&folder, &renderer)?);
        }

        if report.has_errors() {
            if self.config.lint.fail_after_error {
                return Err(PipelineError::LintFailed(report));
            }
            warn!("Lint found {} errors", report.error_count());
        }
        Ok(report)
    }

    /// Copy the boilerplate into a new folder under the emails directory.
    /// The frozen folder set is not updated.
    pub fn scaffold(&self, options: &ScaffoldOptions) -> Result<PathBuf, PipelineError> {
        let paths = &self.config.paths;
        Ok(scaffold(&paths.boilerplate, &paths.emails, options)?)
    }

    /// Zip every output folder. Failures are reported, never raised.
    pub async fn zip(&self) -> ArchiveReport {
        archive_all(&self.folders, &self.config.paths).await
    }

    /// Partials are read fresh on every call so edits show up in dev.
    fn renderer(&self) -> Result<TemplateRenderer, TemplateError> {
        let paths = &self.config.paths;
        TemplateRenderer::new(&paths.src, &paths.partials)
    }

    /// Run `f` for every folder in parallel and wait for all of them.
    /// A failing folder does not stop the others; failures are reported together.
    fn for_each_folder<T, E, F>(&self, task: Task, f: F) -> Result<Vec<(String, T)>, PipelineError>
    where
        T: Send,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(&TemplateFolder) -> Result<T, E> + Sync,
    {
        let folders: Vec<TemplateFolder> = self.folders.folders(&self.config.paths).collect();
        let total = folders.len();

        let results: Vec<(String, Result<T, E>)> = folders
            .par_iter()
            .map(|folder| (folder.name.clone(), f(folder)))
            .collect();

        let mut done = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (folder, result) in results {
            match result {
                Ok(value) => done.push((folder, value)),
                Err(err) => {
                    error!("{}: {} failed: {}", folder, task, err);
                    failures.push(FolderFailure {
                        folder,
                        error: Box::new(err),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(done)
        } else {
            Err(PipelineError::Folders {
                task,
                total,
                failures,
            })
        }
    }
}
