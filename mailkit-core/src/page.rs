use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::config::InlineOptions;
use crate::folder::{TemplateFolder, write_file};
use crate::inline::{InlineError, inline_styles};
use crate::template::{TemplateError, TemplateRenderer};

#[derive(Debug, Error)]
pub enum PageError {
    #[error("Could not read data file {}: {source}", .path.display())]
    DataIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {}: {source}", .path.display())]
    Data {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Data file {} must hold a JSON object", .0.display())]
    DataNotObject(PathBuf),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Inline(#[from] InlineError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load a folder's `data.json`. Malformed or missing data is an error,
/// never an empty context.
pub fn load_data(folder: &TemplateFolder) -> Result<serde_json::Value, PageError> {
    let path = folder.data();
    let raw = std::fs::read_to_string(&path).map_err(|source| PageError::DataIo {
        path: path.clone(),
        source,
    })?;

    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|source| PageError::Data {
            path: path.clone(),
            source,
        })?;

    if !value.is_object() {
        return Err(PageError::DataNotObject(path));
    }

    Ok(value)
}

/// Render `index.tera` with `data.json`, inline its stylesheets and write
/// `<output>/index.html`. Returns `None` when the folder has no page template.
///
/// The context also carries `folder`, the template's own name, unless the
/// data file sets it.
pub fn compile_page(
    folder: &TemplateFolder,
    renderer: &TemplateRenderer,
    options: &InlineOptions,
) -> Result<Option<PathBuf>, PageError> {
    let template = folder.page_template();
    if !template.is_file() {
        debug!("{}: no {}, skipping", folder.name, template.display());
        return Ok(None);
    }

    let mut data = load_data(folder)?;
    if let Some(map) = data.as_object_mut() {
        map.entry("folder")
            .or_insert_with(|| serde_json::Value::from(folder.name.clone()));
    }
    let html = renderer.render_file(&template, &data)?;
    let html = inline_styles(&html, options)?;

    let out = folder.output_html();
    write_file(&out, html)?;
    debug!("{}: rendered {} -> {}", folder.name, template.display(), out.display());

    Ok(Some(out))
}
