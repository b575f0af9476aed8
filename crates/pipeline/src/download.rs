//! Download session: fetch volumes, merge in index order, extract.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use galpack_archive::{PartFile, extract_archive, merge_parts};
use galpack_client::download_part;
use galpack_manifest::load_manifest;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::observer::SessionObserver;

/// Result of a completed download session.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Directory the archive was extracted into.
    pub target_dir: PathBuf,
    /// Number of volumes downloaded.
    pub volumes: usize,
}

pub(crate) async fn run(
    config: &AppConfig,
    http: &reqwest::Client,
    observer: &Arc<dyn SessionObserver>,
    manifest_path: &Path,
) -> Result<DownloadOutcome, PipelineError> {
    // ReadingManifest
    observer.on_log(&format!("Reading manifest {}...", manifest_path.display()));
    let manifest = load_manifest(manifest_path).map_err(PipelineError::ReadingManifest)?;
    let title = manifest.game_title.clone();
    observer.on_log(&format!(
        "{title}: {} volume(s), {} bytes",
        manifest.volumes.len(),
        manifest.total_size()
    ));

    // Downloading, strictly in index order (load_manifest sorts).
    let work_dir = config.work_dir.join(&title);
    std::fs::create_dir_all(&work_dir).map_err(|e| PipelineError::Downloading {
        index: 0,
        source: e.into(),
    })?;

    let total = manifest.volumes.len();
    let mut parts = Vec::with_capacity(total);
    for volume in &manifest.volumes {
        observer.on_log(&format!(
            "Downloading volume {}/{total}: {}",
            volume.index + 1,
            volume.title
        ));
        observer.on_progress(0);

        let dest = work_dir.join(&volume.title);
        let obs = Arc::clone(observer);
        download_part(http, &volume.path, &dest, move |pct| obs.on_progress(pct))
            .await
            .map_err(|source| PipelineError::Downloading {
                index: volume.index,
                source,
            })?;

        parts.push(PartFile {
            index: volume.index,
            path: dest,
            size: volume.size,
        });
    }

    // Merging
    observer.on_log("Merging volumes...");
    let merged = work_dir.join(format!("{title}.tar"));
    merge_parts(&parts, &merged).map_err(PipelineError::Merging)?;

    // Extracting
    observer.on_log("Extracting archive...");
    let target_dir = config.save_dir.join(format!("{title}_unpacked"));
    extract_archive(&merged, &target_dir).map_err(PipelineError::Extracting)?;

    // CleaningUp. The extracted tree is the deliverable; removing the
    // intermediates is best-effort only.
    observer.on_log("Cleaning up volumes...");
    for artifact in parts.iter().map(|p| &p.path).chain([&merged]) {
        if let Err(e) = std::fs::remove_file(artifact) {
            warn!(path = %artifact.display(), error = %e, "cleanup failed");
            observer.on_log(&format!(
                "Warning: could not remove {}: {e}",
                artifact.display()
            ));
        }
    }
    let _ = std::fs::remove_dir(&work_dir);

    info!(target = %target_dir.display(), volumes = total, "download session complete");
    observer.on_log(&format!("Done. Extracted to {}", target_dir.display()));
    Ok(DownloadOutcome {
        target_dir,
        volumes: total,
    })
}
