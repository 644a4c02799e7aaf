use crate::diagnostics::Diagnostic;
use serde::Serialize;

/// A navigation entry whose content has not been resolved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub title: String,
    pub content_src: Option<String>,
}

/// A titled chapter with its normalized plain-text body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    pub title: String,
    /// ePub reference (file plus optional `#fragment`) the content came from.
    /// Always `None` for PDF chapters.
    pub content_src: Option<String>,
    pub content: String,
}

impl Chapter {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content_src: None,
            content: content.into(),
        }
    }

    pub fn resolved(entry: &NavEntry, content: String) -> Self {
        Self {
            title: entry.title.clone(),
            content_src: entry.content_src.clone(),
            content,
        }
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Result of analysing one document.
#[derive(Debug, Default, Serialize)]
pub struct Analysis {
    pub chapters: Vec<Chapter>,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_ignores_extra_whitespace() {
        let ch = Chapter::new("Chapter 1.", "  one two\n\nthree\t four ");
        assert_eq!(ch.word_count(), 4);
    }

    #[test]
    fn resolved_keeps_reference() {
        let entry = NavEntry {
            title: "Chapter 2.".into(),
            content_src: Some("text/ch2.xhtml#start".into()),
        };
        let ch = Chapter::resolved(&entry, "body".into());
        assert_eq!(ch.content_src.as_deref(), Some("text/ch2.xhtml#start"));
        assert_eq!(ch.content, "body");
    }
}
