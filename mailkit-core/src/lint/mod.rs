//! Source linters for template folders.
//!
//! Two linters run per folder: one over the Tera page templates and one over
//! the stylesheets under `styles/`. Both produce [`Diagnostic`]s; the
//! pipeline decides whether errors fail the task.

pub mod markup;
pub mod styles;

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::folder::TemplateFolder;
use crate::template::TemplateRenderer;

#[derive(Debug, Error)]
pub enum LintError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub rule: &'static str,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn at(
        file: &Path,
        source: &str,
        offset: usize,
        rule: &'static str,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let (line, column) = position(source, offset);
        Self {
            file: file.to_path_buf(),
            line,
            column,
            rule,
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}  {}  {}  {}",
            self.file.display(),
            self.line,
            self.column,
            self.severity,
            self.rule,
            self.message
        )
    }
}

/// 1-based line and column of a byte offset.
fn position(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|nl| before[nl + 1..].chars().count())
        .unwrap_or_else(|| before.chars().count())
        + 1;
    (line, column)
}

/// Diagnostics collected for one or more folders.
#[derive(Debug, Default, Clone)]
pub struct LintReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl LintReport {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn extend(&mut self, other: LintReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

impl fmt::Display for LintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        write!(
            f,
            "{} errors, {} warnings",
            self.error_count(),
            self.warning_count()
        )
    }
}

/// Lint every page template and stylesheet in a folder.
pub fn lint_folder(
    folder: &TemplateFolder,
    renderer: &TemplateRenderer,
) -> Result<LintReport, LintError> {
    let mut report = LintReport::default();

    for path in files_with_extensions(&folder.source, &["tera"]) {
        let source = std::fs::read_to_string(&path)?;
        report
            .diagnostics
            .extend(markup::lint(&path, &source, renderer));
    }

    for path in files_with_extensions(&folder.styles_dir(), &["css", "scss"]) {
        let source = std::fs::read_to_string(&path)?;
        report.diagnostics.extend(styles::lint(&path, &source));
    }

    Ok(report)
}

fn files_with_extensions(dir: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
        })
        .collect();
    files.sort();
    files
}
