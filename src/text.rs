//! Markup-to-prose normalization for extracted ePub members.

use crate::diagnostics::Diagnostics;
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::events::Event;
use regex::Regex;
use std::path::Path;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#?[A-Za-z0-9]+;").expect("valid regex"));

/// Elements whose text is never read aloud.
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "title"];

/// Elements that end a line of visible text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "br",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "td",
    "th",
    "tr",
    "ul",
];

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Extract visible text from an (X)HTML fragment.
///
/// Block boundaries become newlines, each line is trimmed and blank lines are
/// dropped. Lone newlines are then fused into spaces by [`merge_soft_breaks`].
///
/// Nothing inside `<head>` is read, `<title>` included, so a page's title only
/// counts toward its words when the body repeats it as a heading.
pub fn markup_to_text(markup: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.expand_empty_elements = false;

    let mut buf = Vec::new();
    let mut raw = String::new();
    let mut hidden_depth: usize = 0;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let local = local_name(e.local_name().as_ref());
                if HIDDEN_ELEMENTS.contains(&local.as_str()) {
                    hidden_depth += 1;
                } else if BLOCK_ELEMENTS.contains(&local.as_str()) {
                    raw.push('\n');
                }
            }
            Event::Empty(ref e) => {
                let local = local_name(e.local_name().as_ref());
                if BLOCK_ELEMENTS.contains(&local.as_str()) {
                    raw.push('\n');
                }
            }
            Event::End(ref e) => {
                let local = local_name(e.local_name().as_ref());
                if HIDDEN_ELEMENTS.contains(&local.as_str()) {
                    hidden_depth = hidden_depth.saturating_sub(1);
                } else if BLOCK_ELEMENTS.contains(&local.as_str()) {
                    raw.push('\n');
                }
            }
            Event::Text(ref e) if hidden_depth == 0 => match e.unescape_with(resolve_html5_entity) {
                Ok(text) => raw.push_str(&text),
                Err(_) => raw.push_str(&unescape_each(&String::from_utf8_lossy(e))),
            },
            Event::CData(ref e) if hidden_depth == 0 => {
                raw.push_str(&String::from_utf8_lossy(e));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    Ok(merge_soft_breaks(&lines.join("\n")))
}

/// Resolve entities one at a time, leaving unrecognized ones as written.
fn unescape_each(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[0];
            unescape_with(entity, resolve_html5_entity)
                .map(|resolved| resolved.into_owned())
                .unwrap_or_else(|_| entity.to_string())
        })
        .into_owned()
}

/// Replace every newline that has no newline on either side with a space.
///
/// Runs of two or more newlines (paragraph breaks) are kept as they are.
pub fn merge_soft_breaks(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '\n' {
            let prev_nl = i > 0 && chars[i - 1] == '\n';
            let next_nl = chars.get(i + 1) == Some(&'\n');
            if !prev_nl && !next_nl {
                out.push(' ');
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Read and normalize one extracted markup file.
///
/// Unreadable or malformed files yield an empty string and a warning.
pub fn normalize_file(path: &Path, diagnostics: &mut Diagnostics) -> String {
    let markup = match std::fs::read_to_string(path) {
        Ok(markup) => markup,
        Err(e) => {
            diagnostics.warn(format!("cannot read {}: {e}", path.display()));
            return String::new();
        }
    };
    match markup_to_text(&markup) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            diagnostics.warn(format!("cannot parse {}: {e}", path.display()));
            String::new()
        }
    }
}
