use crate::chapter::NavEntry;
use crate::diagnostics::Diagnostics;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Append a trailing `.` to a trimmed title that lacks one.
pub fn normalize_title(raw: &str) -> String {
    let title = raw.trim();
    if title.ends_with('.') {
        title.to_string()
    } else {
        format!("{title}.")
    }
}

fn content_src(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"src")
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Parse NCX markup into navigation entries in document order.
///
/// Nested `navPoint`s are flattened parent-first. Parsing stops at the first
/// markup error; entries read up to that point are kept.
pub fn parse_ncx(xml: &str, diagnostics: &mut Diagnostics) -> Vec<NavEntry> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut entries: Vec<NavEntry> = Vec::new();
    // Indices into `entries`/`labels` of the currently open navPoints.
    let mut stack: Vec<usize> = Vec::new();
    let mut in_text = false;
    let mut label_seen: Vec<bool> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"navPoint" => {
                    stack.push(entries.len());
                    entries.push(NavEntry {
                        title: String::new(),
                        content_src: None,
                    });
                    labels.push(String::new());
                    label_seen.push(false);
                }
                b"text" => {
                    in_text = stack.last().is_some_and(|&i| !label_seen[i]);
                }
                b"content" => {
                    if let Some(&i) = stack.last()
                        && entries[i].content_src.is_none()
                    {
                        entries[i].content_src = content_src(e);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"content"
                    && let Some(&i) = stack.last()
                    && entries[i].content_src.is_none()
                {
                    entries[i].content_src = content_src(e);
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_text && let Some(&i) = stack.last() {
                    labels[i].push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"text" => {
                    if in_text && let Some(&i) = stack.last() {
                        label_seen[i] = true;
                    }
                    in_text = false;
                }
                b"navPoint" => {
                    stack.pop();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                diagnostics.warn(format!(
                    "navigation file is malformed at byte {}: {e}; keeping {} entries",
                    reader.buffer_position(),
                    entries.len()
                ));
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    for (entry, label) in entries.iter_mut().zip(labels) {
        entry.title = normalize_title(&label);
    }
    entries
}
