//! Archive partitioning into bounded-size parts.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ArchiveError;

/// Default maximum part size: 400 MiB, the upload endpoint's per-file limit.
pub const DEFAULT_PART_SIZE: u64 = 400 * 1024 * 1024;

/// One part file produced by [`split_archive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartFile {
    /// Zero-based position in the reassembly order.
    pub index: u32,
    /// Location of the part on disk.
    pub path: PathBuf,
    /// Exact byte length of the part.
    pub size: u64,
}

/// Splits `archive_path` into parts of at most `max_part_size` bytes under
/// `out_dir`.
///
/// Parts are named `{stem}.part{index}`. Concatenating them in index order
/// reproduces the archive byte-for-byte; every part except the last is
/// exactly `max_part_size` bytes, and an archive whose size is an exact
/// multiple produces no empty trailing part. A zero-byte archive still
/// yields one (empty) part so the index set `0..N-1` is never empty. For a
/// fixed archive and size the partition is reproducible. On failure every
/// part file written so far is removed and nothing is returned.
pub fn split_archive(
    archive_path: &Path,
    out_dir: &Path,
    max_part_size: u64,
) -> Result<Vec<PartFile>, ArchiveError> {
    if max_part_size == 0 {
        return Err(ArchiveError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "maximum part size must be non-zero",
        )));
    }

    let mut parts = Vec::new();
    match write_parts(archive_path, out_dir, max_part_size, &mut parts) {
        Ok(()) => {
            debug!(
                archive = %archive_path.display(),
                parts = parts.len(),
                "archive split"
            );
            Ok(parts)
        }
        Err(e) => {
            for part in &parts {
                let _ = std::fs::remove_file(&part.path);
            }
            Err(e)
        }
    }
}

fn write_parts(
    archive_path: &Path,
    out_dir: &Path,
    max_part_size: u64,
    parts: &mut Vec<PartFile>,
) -> Result<(), ArchiveError> {
    let stem = archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".into());
    let mut reader = BufReader::new(File::open(archive_path)?);

    loop {
        let index = parts.len() as u32;
        let part_path = out_dir.join(format!("{stem}.part{index}"));

        let copied = match write_one_part(&mut reader, &part_path, max_part_size) {
            Ok(n) => n,
            Err(e) => {
                let _ = std::fs::remove_file(&part_path);
                return Err(e);
            }
        };

        // The previous part consumed the archive exactly; drop the empty
        // trailing file.
        if copied == 0 && index > 0 {
            std::fs::remove_file(&part_path)?;
            return Ok(());
        }

        parts.push(PartFile {
            index,
            path: part_path,
            size: copied,
        });

        if copied < max_part_size {
            return Ok(());
        }
    }
}

fn write_one_part<R: Read>(reader: &mut R, path: &Path, max: u64) -> Result<u64, ArchiveError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let copied = io::copy(&mut reader.by_ref().take(max), &mut writer)?;
    writer.flush()?;
    Ok(copied)
}
