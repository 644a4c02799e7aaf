pub mod archive;
pub mod navigation;
pub mod resolver;

use crate::chapter::Analysis;
use crate::dedup;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::options::AnalysisOptions;
use crate::scratch::ScratchDir;
use crate::text;
use resolver::ExtractedFile;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span};

/// Split an ePub into chapters using its navigation-control file.
///
/// Only an unreadable archive or a missing navigation file fail the call;
/// a corrupt member costs its own chapter and nothing else.
/// The scratch workspace is gone by the time this returns, whatever the
/// outcome.
pub fn analyze_epub(path: &Path, options: &AnalysisOptions) -> Result<Analysis> {
    let span = info_span!("analyze_epub", path = %path.display());
    let _guard = span.enter();

    let mut diagnostics = Diagnostics::default();
    let mut zip = archive::open_archive(path)?;
    let entries = archive::read_navigation(&mut zip, path, &mut diagnostics)?;
    debug!(entries = entries.len(), "parsed navigation");

    let scratch = ScratchDir::create(&options.scratch_root())?;
    archive::extract_all(&mut zip, scratch.path(), &mut diagnostics);

    let files = collect_markup_files(scratch.path(), options, &mut diagnostics)?;
    debug!(files = files.len(), "normalized markup files");

    let chapters = resolver::resolve_chapters(&entries, &files, &mut diagnostics);
    let chapters = dedup::clean_chapters(chapters, &mut diagnostics);
    info!(chapters = chapters.len(), "ePub analysis finished");

    Ok(Analysis {
        chapters,
        diagnostics: diagnostics.into_entries(),
    })
}

/// Normalize every markup file under `root`, keyed by bare file name.
///
/// Files are visited in sorted path order so repeated runs see the same
/// candidate order. When two files share a name the first one is kept.
fn collect_markup_files(
    root: &Path,
    options: &AnalysisOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<ExtractedFile>> {
    let mut paths = Vec::new();
    walk_files(root, &mut paths)?;
    paths.sort();

    let mut files: Vec<ExtractedFile> = Vec::new();
    for path in paths {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if !options.is_markup_file(&name) {
            continue;
        }
        if files.iter().any(|f| f.name == name) {
            diagnostics.warn(format!(
                "duplicate file name {name} at {}; keeping the first",
                path.display()
            ));
            continue;
        }
        let text = text::normalize_file(&path, diagnostics);
        files.push(ExtractedFile::new(name, text));
    }
    Ok(files)
}

fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
