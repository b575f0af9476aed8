//! Manifest persistence: atomic JSON write, validated read.

use std::path::Path;

use tracing::debug;

use crate::{Manifest, ManifestError};

/// Writes `manifest` to `path` atomically.
///
/// The JSON goes to a sibling temporary file first and is renamed over the
/// final path, so a crash mid-write never leaves a half-written manifest
/// visible. The manifest is validated before anything touches disk.
pub fn save_manifest(manifest: &Manifest, path: &Path) -> Result<(), ManifestError> {
    validate(manifest)?;
    let json = serde_json::to_string_pretty(manifest)?;

    let Some(name) = path.file_name() else {
        return Err(ManifestError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "manifest path has no file name",
        )));
    };
    let tmp = path.with_file_name(format!("{}.tmp", name.to_string_lossy()));

    std::fs::write(&tmp, json)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }

    debug!(path = %path.display(), volumes = manifest.volumes.len(), "manifest written");
    Ok(())
}

/// Reads and validates a manifest.
///
/// Unknown JSON fields are ignored; a missing or malformed required field is
/// a [`ManifestError::Format`]. Volumes are returned sorted by `index`, and
/// the index set must be exactly `0..N-1`.
pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let data = std::fs::read_to_string(path)?;
    let mut manifest: Manifest =
        serde_json::from_str(&data).map_err(|e| ManifestError::Format(e.to_string()))?;
    manifest.volumes.sort_by_key(|v| v.index);
    validate(&manifest)?;
    Ok(manifest)
}

/// Checks the manifest invariants: at least one volume, indices exactly
/// `0..N-1` with no duplicates.
fn validate(manifest: &Manifest) -> Result<(), ManifestError> {
    if manifest.volumes.is_empty() {
        return Err(ManifestError::Format("manifest has no volumes".into()));
    }

    let mut seen = vec![false; manifest.volumes.len()];
    for volume in &manifest.volumes {
        let i = volume.index as usize;
        if i >= seen.len() {
            return Err(ManifestError::Format(format!(
                "volume index {} out of range for {} volume(s)",
                volume.index,
                manifest.volumes.len()
            )));
        }
        if seen[i] {
            return Err(ManifestError::Format(format!(
                "duplicate volume index {}",
                volume.index
            )));
        }
        seen[i] = true;
    }
    Ok(())
}
