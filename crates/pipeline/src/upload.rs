//! Upload session: pack, split, upload each part, write the manifest.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use galpack_archive::{pack_dir, split_archive};
use galpack_client::upload_part;
use galpack_manifest::{Manifest, Volume, save_manifest};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::observer::SessionObserver;

/// Result of a completed upload session.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Where the manifest was written.
    pub manifest_path: PathBuf,
    /// Number of volumes uploaded.
    pub volumes: usize,
}

pub(crate) async fn run(
    config: &mut AppConfig,
    config_path: Option<&Path>,
    http: &reqwest::Client,
    observer: &Arc<dyn SessionObserver>,
    source_dir: &Path,
) -> Result<UploadOutcome, PipelineError> {
    let title = source_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".into());

    // Archiving
    observer.on_log(&format!("Packing {}...", source_dir.display()));
    let work_dir = config.work_dir.join(&title);
    std::fs::create_dir_all(&work_dir).map_err(|e| PipelineError::Archiving(e.into()))?;
    let archive_path = work_dir.join(format!("{title}.tar"));
    pack_dir(source_dir, &archive_path).map_err(PipelineError::Archiving)?;

    // Partitioning
    observer.on_log("Splitting archive into volumes...");
    let parts = split_archive(&archive_path, &work_dir, config.max_part_size)
        .map_err(PipelineError::Partitioning)?;
    observer.on_log(&format!("{} volume(s) to upload", parts.len()));

    // Uploading, strictly in index order. The first failure halts the
    // session; volumes already uploaded stay on the server.
    let mut volumes = Vec::with_capacity(parts.len());
    for part in &parts {
        let part_name = part
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{title}.part{}", part.index));

        observer.on_log(&format!(
            "Uploading volume {}/{}: {part_name}",
            part.index + 1,
            parts.len()
        ));
        observer.on_progress(0);

        let obs = Arc::clone(observer);
        let uploaded = upload_part(http, &config.endpoint, &part.path, move |pct| {
            obs.on_progress(pct)
        })
        .await
        .map_err(|source| PipelineError::Uploading {
            index: part.index,
            source,
        })?;

        observer.on_log(&format!("Volume {part_name} -> {}", uploaded.file_id));
        volumes.push(Volume {
            index: part.index,
            title: part_name,
            path: uploaded.file_id,
            md5: uploaded.digest,
            size: uploaded.size,
        });
    }

    // WritingManifest, only after every volume succeeded.
    observer.on_log("Writing manifest...");
    std::fs::create_dir_all(&config.save_dir)
        .map_err(|e| PipelineError::WritingManifest(e.into()))?;
    let manifest = Manifest::new(&title, volumes);
    let manifest_path = config.save_dir.join(format!("{title}.json"));
    save_manifest(&manifest, &manifest_path).map_err(PipelineError::WritingManifest)?;
    info!(
        path = %manifest_path.display(),
        volumes = manifest.volumes.len(),
        "upload session complete"
    );

    // The manifest is durable; history and config persistence are
    // best-effort from here on.
    config.upload_history.push(manifest_path.clone());
    if let Some(path) = config_path {
        if let Err(e) = config.save(path) {
            warn!(path = %path.display(), error = %e, "failed to persist upload history");
        }
    }

    // CleaningUp
    observer.on_log("Cleaning up temporary files...");
    if let Err(e) = std::fs::remove_dir_all(&work_dir) {
        warn!(dir = %work_dir.display(), error = %e, "cleanup failed");
        observer.on_log(&format!(
            "Warning: could not remove {}: {e}",
            work_dir.display()
        ));
    }

    observer.on_log(&format!(
        "Upload complete: {} volume(s), manifest {}",
        manifest.volumes.len(),
        manifest_path.display()
    ));
    Ok(UploadOutcome {
        manifest_path,
        volumes: manifest.volumes.len(),
    })
}
