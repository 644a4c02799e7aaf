use crate::chapter::NavEntry;
use crate::diagnostics::Diagnostics;
use crate::epub::navigation;
use crate::error::{AnalysisError, Result};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

/// Suffix of the navigation-control member (`toc.ncx` and friends).
pub const NAVIGATION_SUFFIX: &str = ".ncx";

pub fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| AnalysisError::Archive {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    ZipArchive::new(file).map_err(|source| AnalysisError::Archive {
        path: path.to_path_buf(),
        source,
    })
}

pub fn list_entries(archive: &ZipArchive<File>) -> Vec<String> {
    (0..archive.len())
        .filter_map(|i| archive.name_for_index(i).map(|s| s.to_string()))
        .collect()
}

/// Name of the first member that looks like a navigation-control file.
pub fn find_navigation_entry(entries: &[String]) -> Option<&str> {
    entries
        .iter()
        .find(|name| name.to_ascii_lowercase().ends_with(NAVIGATION_SUFFIX))
        .map(String::as_str)
}

/// Parse the archive's navigation-control file into ordered entries.
///
/// A missing navigation file is fatal. An unreadable or malformed one is
/// not: whatever entries could be read are returned with a warning.
pub fn read_navigation(
    archive: &mut ZipArchive<File>,
    path: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<NavEntry>> {
    let entries = list_entries(archive);
    let nav_name = find_navigation_entry(&entries)
        .ok_or_else(|| AnalysisError::MissingNavigation(path.to_path_buf()))?
        .to_string();

    let mut bytes = Vec::new();
    archive
        .by_name(&nav_name)
        .map_err(|source| AnalysisError::Archive {
            path: path.to_path_buf(),
            source,
        })?
        .read_to_end(&mut bytes)?;

    let xml = String::from_utf8_lossy(&bytes);
    Ok(navigation::parse_ncx(&xml, diagnostics))
}

/// Extract every member of the archive under `dir`, one at a time.
///
/// A member that cannot be read (bad checksum, unsupported compression) or
/// whose path would escape `dir` is skipped with a warning; the chapter that
/// points at it resolves empty later on. Returns the number of files written.
pub fn extract_all(
    archive: &mut ZipArchive<File>,
    dir: &Path,
    diagnostics: &mut Diagnostics,
) -> usize {
    let mut written = 0;
    for index in 0..archive.len() {
        let name = archive
            .name_for_index(index)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{index}"));
        match extract_member(archive, index, dir) {
            Ok(true) => written += 1,
            Ok(false) => {}
            Err(e) => diagnostics.warn(format!("skipping archive member {name}: {e}")),
        }
    }
    debug!(written, "extracted archive members");
    written
}

/// Write one member below `dir`. Returns `false` for directory entries.
fn extract_member(archive: &mut ZipArchive<File>, index: usize, dir: &Path) -> io::Result<bool> {
    let mut member = archive.by_index(index).map_err(io::Error::other)?;
    let relative = member.enclosed_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "path leaves the extraction directory",
        )
    })?;
    let target = dir.join(relative);
    if member.is_dir() {
        fs::create_dir_all(&target)?;
        return Ok(false);
    }

    // Read fully first so a checksum failure never leaves a partial file.
    let mut bytes = Vec::new();
    member.read_to_end(&mut bytes)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, bytes)?;
    Ok(true)
}
