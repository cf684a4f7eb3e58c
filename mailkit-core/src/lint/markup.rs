use std::path::Path;

use super::{Diagnostic, Severity};
use crate::template::TemplateRenderer;

pub fn lint(path: &Path, source: &str, renderer: &TemplateRenderer) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if let Err(err) = renderer.check_source(path, source) {
        diagnostics.push(Diagnostic::at(
            path,
            source,
            0,
            "template-syntax",
            Severity::Error,
            err.to_string(),
        ));
    }

    diagnostics.extend(img_alt(path, source));
    diagnostics.extend(trailing_whitespace(path, source));
    diagnostics
}

fn img_alt(path: &Path, source: &str) -> Vec<Diagnostic> {
    start_tags(source)
        .into_iter()
        .filter(|tag| tag.name == "img" && !tag.attrs.iter().any(|(name, _)| name == "alt"))
        .map(|tag| {
            Diagnostic::at(
                path,
                source,
                tag.offset,
                "img-alt",
                Severity::Error,
                "<img> is missing an alt attribute",
            )
        })
        .collect()
}

struct StartTag {
    offset: usize,
    name: String,
    attrs: Vec<(String, String)>,
}

/// Start tags in document order. Names are lowercased. Comments are
/// skipped and a `>` inside a quoted value does not end the tag.
fn start_tags(source: &str) -> Vec<StartTag> {
    let bytes = source.as_bytes();
    let mut tags = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i..].starts_with(b"<!--") {
            i = source[i + 4..]
                .find("-->")
                .map_or(bytes.len(), |p| i + 4 + p + 3);
            continue;
        }
        if bytes[i] != b'<' || !bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
            i += 1;
            continue;
        }

        let name_end = source[i + 1..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
            .map_or(bytes.len(), |p| i + 1 + p);
        let (attrs, end) = attributes(source, name_end);
        tags.push(StartTag {
            offset: i,
            name: source[i + 1..name_end].to_ascii_lowercase(),
            attrs,
        });
        i = end;
    }

    tags
}

/// Attributes from `from` up to the closing `>`. Returns them with the
/// offset just past the tag. Valueless attributes map to "".
fn attributes(source: &str, from: usize) -> (Vec<(String, String)>, usize) {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let skip_space = |mut i: usize| {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        i
    };

    let mut attrs = Vec::new();
    let mut i = from;
    loop {
        while i < len && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= len {
            return (attrs, len);
        }
        if bytes[i] == b'>' {
            return (attrs, i + 1);
        }

        let name_start = i;
        while i < len && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'>' | b'/') {
            i += 1;
        }
        let name = source[name_start..i].to_ascii_lowercase();
        i = skip_space(i);

        let mut value = String::new();
        if i < len && bytes[i] == b'=' {
            i = skip_space(i + 1);
            match bytes.get(i) {
                Some(&quote @ (b'"' | b'\'')) => {
                    let close = source[i + 1..]
                        .find(quote as char)
                        .map_or(len, |p| i + 1 + p);
                    value = source[i + 1..close].to_string();
                    i = (close + 1).min(len);
                }
                _ => {
                    let value_start = i;
                    while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = source[value_start..i].to_string();
                }
            }
        }

        if !name.is_empty() {
            attrs.push((name, value));
        }
    }
}

fn trailing_whitespace(path: &Path, source: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut offset = 0;

    for line in source.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let trimmed = content.trim_end();
        if trimmed.len() < content.len() {
            diagnostics.push(Diagnostic::at(
                path,
                source,
                offset + trimmed.len(),
                "no-trailing-whitespace",
                Severity::Warning,
                "Unexpected trailing whitespace",
            ));
        }
        offset += line.len();
    }

    diagnostics
}
