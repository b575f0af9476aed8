//! Directory packing into a single tar archive.
//!
//! The walk collects every regular file under the source root and stores it
//! under its path relative to that root, so extraction reproduces the
//! original layout no matter where the directory lived at pack time.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ArchiveError;

/// Packs every regular file under `src_dir` into a tar archive at
/// `archive_path`.
///
/// Entries use `/`-separated paths relative to `src_dir` and are appended in
/// sorted order, so for an unchanged directory the archive bytes are
/// reproducible. Empty directories are omitted. On failure the partial
/// archive is removed before the error is returned, so no caller can mistake
/// it for complete.
pub fn pack_dir(src_dir: &Path, archive_path: &Path) -> Result<(), ArchiveError> {
    match write_archive(src_dir, archive_path) {
        Ok(count) => {
            debug!(files = count, archive = %archive_path.display(), "directory packed");
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(archive_path);
            Err(e)
        }
    }
}

fn write_archive(src_dir: &Path, archive_path: &Path) -> Result<usize, ArchiveError> {
    let mut files = Vec::new();
    collect_files(src_dir, src_dir, &mut files)?;
    files.sort();

    let out = BufWriter::new(File::create(archive_path)?);
    let mut builder = tar::Builder::new(out);
    for rel in &files {
        let name = rel.to_string_lossy().replace('\\', "/");
        builder.append_path_with_name(src_dir.join(rel), name)?;
    }

    // into_inner finishes the archive (terminating blocks) and hands the
    // writer back for the final flush.
    let mut out = builder.into_inner()?;
    out.flush()?;
    Ok(files.len())
}

fn collect_files(
    root: &Path,
    current: &Path,
    files: &mut Vec<PathBuf>,
) -> Result<(), ArchiveError> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            collect_files(root, &path, files)?;
        } else if metadata.is_file() {
            let rel = path.strip_prefix(root).map_err(std::io::Error::other)?;
            files.push(rel.to_path_buf());
        }
    }
    Ok(())
}
