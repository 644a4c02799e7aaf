//! Per-run scratch workspaces and cleanup of leftovers.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name prefix of ePub extraction workspaces.
pub const EPUB_SCRATCH_PREFIX: &str = "epub_temp_";

/// Name prefix of workspaces left behind by the narration side.
pub const AUDIOBOOK_SCRATCH_PREFIX: &str = "audiobook_temp";

const SCRATCH_PREFIXES: &[&str] = &[EPUB_SCRATCH_PREFIX, AUDIOBOOK_SCRATCH_PREFIX];

/// A temporary directory that is removed when dropped.
///
/// Names carry the process id plus a random suffix so concurrent analyses,
/// in one process or several, never share a workspace.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn create(root: &Path) -> std::io::Result<Self> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let name = format!("{EPUB_SCRATCH_PREFIX}{}_{}", std::process::id(), &token[..8]);
        let path = root.join(name);
        std::fs::create_dir_all(&path)?;
        debug!(path = %path.display(), "created scratch workspace");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed scratch workspace"),
            Err(e) => warn!(path = %self.path.display(), "failed to remove scratch workspace: {e}"),
        }
    }
}

/// Remove leftover scratch workspaces under the system temp directory.
pub fn clean_scratch_workspaces() -> usize {
    clean_scratch_workspaces_in(&std::env::temp_dir())
}

/// Remove every directory under `root` whose name starts with a known
/// scratch prefix. Failures are logged and skipped. Returns how many
/// directories were removed.
pub fn clean_scratch_workspaces_in(root: &Path) -> usize {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(root = %root.display(), "cannot list scratch root: {e}");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if !SCRATCH_PREFIXES.iter().any(|p| name.starts_with(p)) {
            continue;
        }
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        match std::fs::remove_dir_all(&path) {
            Ok(()) => {
                info!(path = %path.display(), "removed leftover scratch workspace");
                removed += 1;
            }
            Err(e) => warn!(path = %path.display(), "failed to remove scratch workspace: {e}"),
        }
    }
    removed
}
