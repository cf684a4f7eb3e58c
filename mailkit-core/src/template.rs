use std::error::Error as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template error: {}", describe(.0))]
    Tera(#[from] tera::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Template not found: {}", .0.display())]
    Missing(PathBuf),
}

/// Tera keeps the useful part of its messages in the source chain.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Tera wrapper that knows about the project's shared partials.
///
/// Templates are named by their path relative to the source root, so a page
/// can `{% extends "layout/base.tera" %}`.
#[derive(Clone)]
pub struct TemplateRenderer {
    tera: Tera,
    root: PathBuf,
}

impl TemplateRenderer {
    pub fn new(root: &Path, partial_dirs: &[PathBuf]) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html", ".htm", ".tera"]);
        let mut files = Vec::new();

        for dir in partial_dirs.iter().filter(|d| d.is_dir()) {
            for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() {
                    let name = template_name(root, entry.path());
                    files.push((entry.path().to_path_buf(), Some(name)));
                }
            }
        }

        tera.add_template_files(files)?;

        Ok(Self {
            tera,
            root: root.to_path_buf(),
        })
    }

    /// Parse template source as if it lived at `path`, without rendering it.
    pub fn check_source(&self, path: &Path, source: &str) -> Result<(), TemplateError> {
        let mut tera = self.tera.clone();
        tera.add_raw_template(&template_name(&self.root, path), source)?;
        Ok(())
    }

    /// Render a template file against an arbitrary serializable context.
    pub fn render_file<T: Serialize>(&self, path: &Path, data: &T) -> Result<String, TemplateError> {
        let context = Context::from_serialize(data)?;
        self.render_file_with_context(path, &context)
    }

    pub fn render_file_with_context(
        &self,
        path: &Path,
        context: &Context,
    ) -> Result<String, TemplateError> {
        if !path.is_file() {
            return Err(TemplateError::Missing(path.to_path_buf()));
        }

        let source = std::fs::read_to_string(path)?;
        let name = template_name(&self.root, path);

        // Pages are added to a per-call copy so one page never sees another.
        let mut tera = self.tera.clone();
        tera.add_raw_template(&name, &source)?;
        Ok(tera.render(&name, context)?)
    }
}

fn template_name(root: &Path, path: &Path) -> String {
    let relative = path
        .strip_prefix(root)
        .ok()
        .or_else(|| path.file_name().map(Path::new))
        .unwrap_or(path);

    relative
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
