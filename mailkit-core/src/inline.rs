//! Style inlining for rendered pages.
//!
//! Two passes. First every `<link rel="stylesheet">` that points at a local
//! file is swapped for a `<style>` block with the file's contents. Then
//! `css-inline` copies the rules into `style` attributes. `<style>` blocks
//! are kept by default, which is where `@media` rules survive since they
//! cannot be expressed inline. Scripts and images are never touched.

use std::path::{Path, PathBuf};

use css_inline::CSSInliner;
use lol_html::errors::RewritingError;
use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str};
use thiserror::Error;

use crate::config::InlineOptions;

#[derive(Debug, Error)]
pub enum InlineError {
    #[error("Could not read stylesheet {}: {source}", .path.display())]
    Stylesheet {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSS inlining failed: {0}")]
    Inline(#[from] css_inline::InlineError),
    #[error("Could not rewrite stylesheet links: {0}")]
    Rewrite(String),
}

pub fn inline_styles(html: &str, options: &InlineOptions) -> Result<String, InlineError> {
    let html = if options.links {
        embed_linked_stylesheets(html, &options.relative_to)?
    } else {
        html.to_string()
    };

    let inliner = CSSInliner::options()
        .keep_style_tags(options.keep_style_tags)
        .keep_link_tags(true)
        .load_remote_stylesheets(false)
        .build();

    Ok(inliner.inline(&html)?)
}

/// Replace local `<link rel="stylesheet">` elements with `<style>` blocks.
///
/// Commented-out links are left alone.
pub fn embed_linked_stylesheets(html: &str, relative_to: &Path) -> Result<String, InlineError> {
    let element_content_handlers = vec![element!("link[rel~=stylesheet][href]", |el| {
        let Some(href) = el.get_attribute("href") else {
            return Ok(());
        };
        if href.is_empty() || is_remote(&href) {
            return Ok(());
        }

        let path = resolve(relative_to, &href);
        let css = std::fs::read_to_string(&path)
            .map_err(|source| InlineError::Stylesheet { path, source })?;
        el.replace(
            &format!("<style type=\"text/css\">\n{css}\n</style>"),
            ContentType::Html,
        );
        Ok(())
    })];

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers,
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|err| match err {
        RewritingError::ContentHandlerError(inner) => match inner.downcast::<InlineError>() {
            Ok(inline) => *inline,
            Err(other) => InlineError::Rewrite(other.to_string()),
        },
        other => InlineError::Rewrite(other.to_string()),
    })
}

fn is_remote(href: &str) -> bool {
    let href = href.to_ascii_lowercase();
    ["http://", "https://", "//", "data:"]
        .iter()
        .any(|prefix| href.starts_with(prefix))
}

fn resolve(relative_to: &Path, href: &str) -> PathBuf {
    let href = href.split(['?', '#']).next().unwrap_or(href);
    relative_to.join(href.trim_start_matches('/'))
}
