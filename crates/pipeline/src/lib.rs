//! Session orchestration for the split/upload and download/merge pipelines.
//!
//! The [`Orchestrator`] owns the configuration, the HTTP client and the
//! observer, and runs one session at a time: every step executes strictly
//! after the previous one, parts move in increasing index order, and the
//! first failure halts the session with the step it happened in. It is a
//! library with no UI dependencies; callers hear about progress only
//! through [`SessionObserver`].

mod config;
mod download;
mod error;
mod observer;
mod upload;

pub use config::AppConfig;
pub use download::DownloadOutcome;
pub use error::{PipelineError, Step};
pub use observer::{NullObserver, SessionObserver};
pub use upload::UploadOutcome;

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sequences upload and download sessions.
pub struct Orchestrator {
    config: AppConfig,
    config_path: Option<PathBuf>,
    http: reqwest::Client,
    observer: Arc<dyn SessionObserver>,
}

impl Orchestrator {
    /// Creates an orchestrator over the given configuration and observer.
    pub fn new(config: AppConfig, observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            config,
            config_path: None,
            http: reqwest::Client::new(),
            observer,
        }
    }

    /// Persists configuration changes (the upload history) to `path` after
    /// each successful upload session. Without this the history is kept in
    /// memory only.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Current configuration (sessions append to the upload history).
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs a full upload session: pack `source_dir`, split it into
    /// volumes, upload each volume and write the manifest.
    pub async fn upload(&mut self, source_dir: &Path) -> Result<UploadOutcome, PipelineError> {
        upload::run(
            &mut self.config,
            self.config_path.as_deref(),
            &self.http,
            &self.observer,
            source_dir,
        )
        .await
    }

    /// Runs a full download session from a manifest written by a previous
    /// upload: fetch every volume, merge them in index order and extract.
    pub async fn download(
        &mut self,
        manifest_path: &Path,
    ) -> Result<DownloadOutcome, PipelineError> {
        download::run(&self.config, &self.http, &self.observer, manifest_path).await
    }
}
