//! Temporary file staging
//!
//! Some archive readers only work on paths. This module writes in-memory
//! content to a uniquely named temporary file that is removed again when its
//! guard goes out of scope.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Guard for a staged file that removes it on drop
#[derive(Debug)]
pub(crate) struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        // Silently ignore errors during cleanup
        let _ = fs::remove_file(&self.path);
    }
}

/// Writes `content` into a fresh temporary file
///
/// The file name is `{prefix}_{ulid}.{extension}` inside the system's
/// temporary directory.
pub(crate) fn stage_bytes(prefix: &str, extension: &str, content: &[u8]) -> io::Result<StagedFile> {
    let ulid = ulid::Ulid::new();
    let path = std::env::temp_dir().join(format!("{}_{}.{}", prefix, ulid, extension));

    // Own the guard before writing so a failed write still cleans up
    let staged = StagedFile { path };
    let mut file = File::create(staged.path())?;
    file.write_all(content)?;
    file.flush()?;

    Ok(staged)
}
