use std::fs;
use std::path::{Path, PathBuf};

use crate::{Result, StemMixError};

/// Lists the regular files directly inside `dir`, sorted by path.
///
/// Subdirectories and other non-regular entries are skipped. Failing to
/// read the directory itself is fatal to the batch.
pub fn list_stem_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_error = |source: std::io::Error| StemMixError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let path = entry.path();
        // Follows symlinks so linked stems are treated like regular files.
        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => files.push(path),
            Ok(_) => tracing::debug!(path = %path.display(), "skipping non-regular entry"),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable entry")
            }
        }
    }

    files.sort();
    tracing::debug!(dir = %dir.display(), files = files.len(), "listed input directory");
    Ok(files)
}
