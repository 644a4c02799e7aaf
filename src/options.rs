use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default ratio of the document's largest font size at which a PDF line
/// counts as a heading.
pub const DEFAULT_HEADING_FONT_RATIO: f32 = 0.9;

/// Tunables for one analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Directory that receives scratch workspaces. `None` means the system
    /// temp directory.
    pub scratch_root: Option<PathBuf>,
    pub heading_font_ratio: f32,
    /// Extensions (without the dot) of extracted ePub members treated as
    /// markup to normalize.
    pub markup_extensions: Vec<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            scratch_root: None,
            heading_font_ratio: DEFAULT_HEADING_FONT_RATIO,
            markup_extensions: vec!["html".into(), "htm".into(), "xhtml".into()],
        }
    }
}

impl AnalysisOptions {
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn is_markup_file(&self, name: &str) -> bool {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return false;
        };
        self.markup_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}
