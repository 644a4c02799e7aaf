//! Split ePub and PDF books into titled plain-text chapters.
//!
//! ePub books are split along their navigation-control file; PDFs along
//! heading patterns and font sizes. Every entry point returns the chapters
//! together with the recoverable problems met on the way.

pub mod chapter;
pub mod dedup;
pub mod diagnostics;
pub mod epub;
pub mod error;
pub mod options;
pub mod pdf;
pub mod scratch;
pub mod text;
pub mod util;

pub use chapter::{Analysis, Chapter, NavEntry};
pub use diagnostics::{Diagnostic, DiagnosticLevel, Diagnostics};
pub use epub::analyze_epub;
pub use error::{AnalysisError, Result};
pub use options::AnalysisOptions;
pub use pdf::analyze_pdf;
pub use scratch::{clean_scratch_workspaces, clean_scratch_workspaces_in};

use std::path::Path;

/// Supported input kinds, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Epub,
    Pdf,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "epub" => Some(Self::Epub),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Analyse an ePub or PDF, picking the pipeline from the extension.
pub fn analyze_document(path: &Path, options: &AnalysisOptions) -> Result<Analysis> {
    match DocumentKind::from_path(path) {
        Some(DocumentKind::Epub) => analyze_epub(path, options),
        Some(DocumentKind::Pdf) => analyze_pdf(path, options),
        None => Err(AnalysisError::UnsupportedFormat(path.to_path_buf())),
    }
}
