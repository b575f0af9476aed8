//! Part concatenation in index order.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::{ArchiveError, PartFile};

/// Concatenates `parts` into `output`, strictly in ascending index order.
///
/// The order parts are supplied in does not matter; reconstruction depends
/// only on each part's index, never on file names or enumeration order.
/// Returns the total number of bytes written.
pub fn merge_parts(parts: &[PartFile], output: &Path) -> Result<u64, ArchiveError> {
    let mut ordered: Vec<&PartFile> = parts.iter().collect();
    ordered.sort_by_key(|p| p.index);

    let mut writer = BufWriter::new(File::create(output)?);
    let mut total = 0u64;
    for part in ordered {
        let mut reader = BufReader::new(File::open(&part.path)?);
        total += io::copy(&mut reader, &mut writer)?;
    }
    writer.flush()?;

    debug!(parts = parts.len(), bytes = total, output = %output.display(), "parts merged");
    Ok(total)
}
