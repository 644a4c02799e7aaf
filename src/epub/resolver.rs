use crate::chapter::{Chapter, NavEntry};
use crate::diagnostics::Diagnostics;
use crate::text::collapse_whitespace;

/// Normalized text of one extracted markup file, keyed by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub name: String,
    pub text: String,
}

impl ExtractedFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// File name a content reference points at: last path segment, anchor
/// removed.
pub fn reference_base_name(content_src: &str) -> &str {
    let without_anchor = content_src.split('#').next().unwrap_or(content_src);
    without_anchor
        .rsplit('/')
        .next()
        .unwrap_or(without_anchor)
}

/// Fill every navigation entry with the text of the file it references.
///
/// A file matches when its name contains the reference's base name. When
/// several files match, the first in `files` order wins.
pub fn resolve_chapters(
    entries: &[NavEntry],
    files: &[ExtractedFile],
    diagnostics: &mut Diagnostics,
) -> Vec<Chapter> {
    entries
        .iter()
        .map(|entry| {
            let Some(src) = entry.content_src.as_deref() else {
                diagnostics.warn(format!(
                    "chapter '{}' has no content reference",
                    entry.title
                ));
                return Chapter::resolved(entry, String::new());
            };

            let base = reference_base_name(src);
            let candidates: Vec<&ExtractedFile> =
                files.iter().filter(|f| f.name.contains(base)).collect();

            let raw = match candidates.as_slice() {
                [] => {
                    diagnostics.warn(format!("no extracted file matches content reference {src}"));
                    ""
                }
                [only] => only.text.as_str(),
                [first, ..] => {
                    let names: Vec<&str> = candidates.iter().map(|f| f.name.as_str()).collect();
                    diagnostics.warn(format!(
                        "several files match content reference {src}: {}; using {}",
                        names.join(", "),
                        first.name
                    ));
                    first.text.as_str()
                }
            };

            let content = collapse_whitespace(raw);
            if content.is_empty() {
                diagnostics.warn(format!(
                    "chapter '{}' is empty; check source file {src}",
                    entry.title
                ));
            }
            Chapter::resolved(entry, content)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, src: &str) -> NavEntry {
        NavEntry {
            title: title.to_string(),
            content_src: Some(src.to_string()),
        }
    }

    #[test]
    fn base_name_strips_dirs_and_anchor() {
        assert_eq!(reference_base_name("Text/ch1.xhtml#sec2"), "ch1.xhtml");
        assert_eq!(reference_base_name("ch1.xhtml"), "ch1.xhtml");
        assert_eq!(reference_base_name("../a/b/c.html#"), "c.html");
    }

    #[test]
    fn single_match_is_collapsed() {
        let files = vec![ExtractedFile::new("ch1.xhtml", "Hello\n\n  world")];
        let mut diag = Diagnostics::default();
        let chapters = resolve_chapters(&[entry("Chapter 1.", "Text/ch1.xhtml#top")], &files, &mut diag);
        assert_eq!(chapters[0].content, "Hello world");
        assert_eq!(chapters[0].content_src.as_deref(), Some("Text/ch1.xhtml#top"));
        assert!(diag.entries().is_empty());
    }

    #[test]
    fn multiple_matches_first_wins() {
        let files = vec![
            ExtractedFile::new("part_ch1.xhtml", "first candidate"),
            ExtractedFile::new("ch1.xhtml", "second candidate"),
        ];
        let mut diag = Diagnostics::default();
        let chapters = resolve_chapters(&[entry("Chapter 1.", "ch1.xhtml")], &files, &mut diag);
        assert_eq!(chapters[0].content, "first candidate");

        let warnings: Vec<_> = diag.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("part_ch1.xhtml, ch1.xhtml"));
    }

    #[test]
    fn no_match_is_empty_with_warnings() {
        let files = vec![ExtractedFile::new("ch2.xhtml", "text")];
        let mut diag = Diagnostics::default();
        let chapters = resolve_chapters(&[entry("Chapter 1.", "ch1.xhtml")], &files, &mut diag);
        assert_eq!(chapters.len(), 1);
        assert!(chapters[0].content.is_empty());
        // One for the missing match, one for the empty chapter.
        assert_eq!(diag.warnings().count(), 2);
    }

    #[test]
    fn missing_reference_keeps_chapter() {
        let nav = NavEntry {
            title: "Cover.".into(),
            content_src: None,
        };
        let mut diag = Diagnostics::default();
        let chapters = resolve_chapters(&[nav], &[], &mut diag);
        assert_eq!(chapters[0].title, "Cover.");
        assert!(chapters[0].content.is_empty());
        assert_eq!(diag.warnings().count(), 1);
    }
}
