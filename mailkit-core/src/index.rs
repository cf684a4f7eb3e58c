use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::folder::{FolderSet, OUTPUT_FILE, write_file};
use crate::template::{TemplateError, TemplateRenderer};

#[derive(Serialize)]
struct IndexContext<'a> {
    links: &'a FolderSet,
}

/// Render the landing page that links every template folder.
///
/// The template sees `links`, the folder names in discovery order.
pub fn build_index(
    renderer: &TemplateRenderer,
    template: &Path,
    folders: &FolderSet,
    dist: &Path,
) -> Result<PathBuf, TemplateError> {
    let html = renderer.render_file(template, &IndexContext { links: folders })?;

    let out = dist.join(OUTPUT_FILE);
    write_file(&out, html)?;
    info!("Wrote index page with {} links to {}", folders.len(), out.display());

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"<ul>{% for link in links %}<li><a href="{{ link }}/index.html">{{ link }}</a></li>{% endfor %}</ul>"#;

    #[test]
    fn one_link_per_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let template = tmp.path().join("index.tera");
        std::fs::write(&template, TEMPLATE).unwrap();
        let dist = tmp.path().join("dist");

        let renderer = TemplateRenderer::new(tmp.path(), &[]).unwrap();
        for order in [["a", "b", "c"], ["c", "a", "b"]] {
            let folders: FolderSet = order.into_iter().map(String::from).collect();
            let out = build_index(&renderer, &template, &folders, &dist).unwrap();
            let html = std::fs::read_to_string(out).unwrap();

            assert_eq!(html.matches("<a ").count(), 3);
            for name in ["a", "b", "c"] {
                assert!(html.contains(&format!(r#"href="{name}/index.html""#)));
            }
        }
    }

    #[test]
    fn missing_template_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = TemplateRenderer::new(tmp.path(), &[]).unwrap();
        let err = build_index(
            &renderer,
            &tmp.path().join("index.tera"),
            &FolderSet::default(),
            tmp.path(),
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::Missing(_)));
    }
}
