pub mod detect;
pub mod layout;

use crate::chapter::Analysis;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::options::AnalysisOptions;
use std::path::Path;
use tracing::{debug, info, info_span};

/// Split a PDF into chapters from heading patterns and font sizes.
///
/// Finding no chapters is not an error: the result is empty and carries a
/// diagnostic.
pub fn analyze_pdf(path: &Path, options: &AnalysisOptions) -> Result<Analysis> {
    let span = info_span!("analyze_pdf", path = %path.display());
    let _guard = span.enter();

    let mut diagnostics = Diagnostics::default();
    let lines = layout::extract_lines(path, &mut diagnostics)?;
    debug!(lines = lines.len(), "extracted PDF text lines");

    let chapters = detect::detect_chapters(&lines, options.heading_font_ratio, &mut diagnostics);
    info!(chapters = chapters.len(), "PDF analysis finished");

    Ok(Analysis {
        chapters,
        diagnostics: diagnostics.into_entries(),
    })
}
