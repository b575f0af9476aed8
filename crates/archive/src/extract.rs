//! Archive extraction.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::ArchiveError;

/// Unpacks `archive_path` into `target_dir`, creating intermediate
/// directories as needed.
///
/// A byte stream that does not parse as a tar archive is reported as
/// [`ArchiveError::Extraction`]; with split volumes that almost always
/// means a part went missing or was merged out of order. The error is
/// returned before any cleanup so the artifacts stay on disk for
/// inspection.
pub fn extract_archive(archive_path: &Path, target_dir: &Path) -> Result<(), ArchiveError> {
    std::fs::create_dir_all(target_dir)?;

    let mut archive = tar::Archive::new(BufReader::new(File::open(archive_path)?));
    archive
        .unpack(target_dir)
        .map_err(|e| ArchiveError::Extraction(e.to_string()))?;

    debug!(archive = %archive_path.display(), target = %target_dir.display(), "archive extracted");
    Ok(())
}
