use std::path::{Path, PathBuf};

use minify_html::Cfg;
use mrml::prelude::render::RenderOptions;
use thiserror::Error;
use tracing::debug;

use crate::config::MjmlOptions;
use crate::folder::{TemplateFolder, write_file};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid MJML in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("Could not render {}: {message}", .path.display())]
    Render { path: PathBuf, message: String },
}

/// Compile MJML source into email-safe HTML.
pub fn compile_mjml(source: &str, options: &MjmlOptions) -> Result<String, CompileError> {
    compile(source, options, Path::new("<input>"))
}

/// Compile a folder's `index.mjml` into `<output>/index.html`.
///
/// Returns `None` when the folder has no MJML source.
pub fn compile_folder(
    folder: &TemplateFolder,
    options: &MjmlOptions,
) -> Result<Option<PathBuf>, CompileError> {
    let path = folder.mjml();
    if !path.is_file() {
        debug!("{}: no {}, skipping", folder.name, path.display());
        return Ok(None);
    }

    let source = std::fs::read_to_string(&path)?;
    let html = compile(&source, options, &path)?;

    let out = folder.output_html();
    write_file(&out, html)?;
    debug!("{}: compiled {} -> {}", folder.name, path.display(), out.display());

    Ok(Some(out))
}

fn compile(source: &str, options: &MjmlOptions, path: &Path) -> Result<String, CompileError> {
    let root = mrml::parse(source).map_err(|e| CompileError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let html = root
        .render(&RenderOptions::default())
        .map_err(|e| CompileError::Render {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if !options.minify {
        return Ok(html);
    }

    Ok(String::from_utf8_lossy(&minify_html::minify(html.as_bytes(), &minify_config())).into_owned())
}

fn minify_config() -> Cfg {
    let mut cfg = Cfg::new();
    // Outlook conditionals live in comments.
    cfg.keep_comments = true;
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.do_not_minify_doctype = true;
    cfg.minify_css = true;
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;

    const VALID: &str = r#"<mjml>
  <mj-body>
    <mj-section>
      <mj-column>
        <mj-text>Hello Ada</mj-text>
      </mj-column>
    </mj-section>
  </mj-body>
</mjml>"#;

    #[test]
    fn compiles_valid_markup_to_html() {
        let html = compile_mjml(VALID, &MjmlOptions::default()).unwrap();
        let trimmed = html.trim();

        assert!(trimmed.to_lowercase().starts_with("<!doctype html>"));
        assert!(trimmed.ends_with("</html>"));
        assert!(html.contains("Hello Ada"));
        assert_eq!(html.matches("<body").count(), 1);
        assert_eq!(html.matches("</body>").count(), 1);
    }

    #[test]
    fn minify_shrinks_output() {
        let pretty = compile_mjml(VALID, &MjmlOptions { minify: false }).unwrap();
        let minified = compile_mjml(VALID, &MjmlOptions { minify: true }).unwrap();
        assert!(minified.len() < pretty.len());
    }

    #[test]
    fn unterminated_tag_fails() {
        let err = compile_mjml("<mjml><mj-body><mj-section>", &MjmlOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::Parse { .. }));
    }

    #[test]
    fn compile_folder_writes_index_html() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = PathsConfig {
            emails: tmp.path().join("emails"),
            dist: tmp.path().join("dist"),
            ..PathsConfig::default()
        };
        let folder = TemplateFolder::new("welcome", &paths);
        std::fs::create_dir_all(&folder.source).unwrap();
        std::fs::write(folder.mjml(), VALID).unwrap();

        let out = compile_folder(&folder, &MjmlOptions::default()).unwrap().unwrap();

        assert_eq!(out, tmp.path().join("dist/welcome/index.html"));
        assert!(std::fs::read_to_string(out).unwrap().contains("Hello Ada"));
    }

    #[test]
    fn folder_without_mjml_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = PathsConfig {
            emails: tmp.path().join("emails"),
            dist: tmp.path().join("dist"),
            ..PathsConfig::default()
        };
        let folder = TemplateFolder::new("empty", &paths);
        std::fs::create_dir_all(&folder.source).unwrap();

        assert!(compile_folder(&folder, &MjmlOptions::default()).unwrap().is_none());
        assert!(!folder.output.exists());
    }
}
