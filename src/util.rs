use crate::chapter::Chapter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Turn a title into a safe file name component.
pub fn sanitize_filename(name: &str) -> String {
    let slug = slug::slugify(name);
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// File stem of the book, used to name its export folder.
pub fn book_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "book".to_string())
}

/// Write each chapter with content to `<out_dir>/<book>/<NN>-<title>.txt`.
///
/// Chapters without content are skipped; numbering follows the chapter's
/// position in `chapters`. Returns the written paths.
pub fn export_chapters(
    chapters: &[Chapter],
    book_path: &Path,
    out_dir: &Path,
) -> std::io::Result<Vec<PathBuf>> {
    let folder = out_dir.join(sanitize_filename(&book_name(book_path)));
    std::fs::create_dir_all(&folder)?;

    let width = chapters.len().to_string().len().max(2);
    let mut written = Vec::new();
    for (i, chapter) in chapters.iter().enumerate() {
        if chapter.content.trim().is_empty() {
            continue;
        }
        let file_name = format!(
            "{:0width$}-{}.txt",
            i + 1,
            sanitize_filename(&chapter.title)
        );
        let path = folder.join(file_name);
        std::fs::write(&path, &chapter.content)?;
        written.push(path);
    }
    info!(
        folder = %folder.display(),
        files = written.len(),
        "exported chapters"
    );
    Ok(written)
}
