use std::path::Path;

use super::{Diagnostic, Severity};

pub fn lint(path: &Path, source: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let (masked, unclosed_comment) = mask(source);

    if let Some(offset) = unclosed_comment {
        diagnostics.push(Diagnostic::at(
            path,
            source,
            offset,
            "no-unclosed-block",
            Severity::Error,
            "Unclosed comment",
        ));
    }

    let bytes = masked.as_bytes();
    let mut open_blocks: Vec<usize> = Vec::new();
    let mut segment_start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => {
                // `#{...}` is SCSS interpolation, not a block.
                if i > 0 && bytes[i - 1] == b'#' {
                    continue;
                }
                open_blocks.push(i);
                if masked[i + 1..].trim_start().starts_with('}') {
                    diagnostics.push(Diagnostic::at(
                        path,
                        source,
                        i,
                        "block-no-empty",
                        Severity::Error,
                        "Unexpected empty block",
                    ));
                }
                segment_start = i + 1;
            }
            b'}' => {
                if is_interpolation_end(bytes, i) {
                    continue;
                }
                if open_blocks.pop().is_none() {
                    diagnostics.push(Diagnostic::at(
                        path,
                        source,
                        i,
                        "no-unclosed-block",
                        Severity::Error,
                        "Unexpected closing brace",
                    ));
                }
                declaration(path, source, &masked, segment_start, i, &mut diagnostics);
                segment_start = i + 1;
            }
            b';' => {
                declaration(path, source, &masked, segment_start, i, &mut diagnostics);
                segment_start = i + 1;
            }
            _ => {}
        }
    }

    for offset in open_blocks {
        diagnostics.push(Diagnostic::at(
            path,
            source,
            offset,
            "no-unclosed-block",
            Severity::Error,
            "Unclosed block",
        ));
    }

    diagnostics.sort_by_key(|d| (d.line, d.column));
    diagnostics
}

/// Check the declaration in `masked[start..end]`, if it is one.
fn declaration(
    path: &Path,
    source: &str,
    masked: &str,
    start: usize,
    end: usize,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let text = &masked[start..end];
    let Some(colon) = text.find(':') else {
        return;
    };
    let value_start = start + colon + 1;
    let value = &masked[value_start..end];

    if let Some(pos) = value.to_ascii_lowercase().find("!important") {
        diagnostics.push(Diagnostic::at(
            path,
            source,
            value_start + pos,
            "declaration-no-important",
            Severity::Warning,
            "Unexpected !important",
        ));
    }

    let value_bytes = value.as_bytes();
    for (i, _) in value.match_indices('#') {
        if value_bytes.get(i + 1) == Some(&b'{') {
            continue;
        }
        let token: String = value[i + 1..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        let valid = matches!(token.len(), 3 | 4 | 6 | 8)
            && token.chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            diagnostics.push(Diagnostic::at(
                path,
                source,
                value_start + i,
                "color-no-invalid-hex",
                Severity::Error,
                format!("Unexpected invalid hex color \"#{token}\""),
            ));
        }
    }
}

fn is_interpolation_end(bytes: &[u8], close: usize) -> bool {
    let mut depth = 0usize;
    for i in (0..close).rev() {
        match bytes[i] {
            b'}' => depth += 1,
            b'{' if depth > 0 => depth -= 1,
            b'{' => return i > 0 && bytes[i - 1] == b'#',
            b';' if depth == 0 => return false,
            _ => {}
        }
    }
    false
}

/// Blank out comments and string contents, keeping byte offsets.
/// Also returns the offset of an unterminated block comment.
fn mask(source: &str) -> (String, Option<usize>) {
    let bytes = source.as_bytes();
    let mut out = bytes.to_vec();
    let mut unclosed = None;
    let mut i = 0;

    let blank = |out: &mut Vec<u8>, from: usize, to: usize| {
        for b in &mut out[from..to] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    };

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = source[i + 2..].find("*/").map(|p| i + 2 + p + 2);
                match end {
                    Some(end) => {
                        blank(&mut out, i, end);
                        i = end;
                    }
                    None => {
                        unclosed = Some(i);
                        blank(&mut out, i, bytes.len());
                        i = bytes.len();
                    }
                }
            }
            // SCSS line comment. `//` inside url() values is kept.
            b'/' if bytes.get(i + 1) == Some(&b'/') && (i == 0 || bytes[i - 1] != b':') => {
                let end = source[i..].find('\n').map(|p| i + p).unwrap_or(bytes.len());
                blank(&mut out, i, end);
                i = end;
            }
            quote @ (b'"' | b'\'') => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j] != quote && bytes[j] != b'\n' {
                    if bytes[j] == b'\\' {
                        j += 1;
                    }
                    j += 1;
                }
                let end = j.min(bytes.len());
                blank(&mut out, i + 1, end);
                i = end + 1;
            }
            _ => i += 1,
        }
    }

    // Blanked ranges start and end on ASCII bytes.
    let masked = String::from_utf8(out)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
    (masked, unclosed)
}
