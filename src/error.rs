use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a whole analysis call.
///
/// Per-file problems never surface here; they are recorded as
/// [`crate::diagnostics::Diagnostic`]s and the call carries on.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("cannot open archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("no navigation file (*.ncx) found in {}", .0.display())]
    MissingNavigation(PathBuf),

    #[error("unsupported document type: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
