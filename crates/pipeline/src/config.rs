//! Application configuration and upload history.
//!
//! An explicit struct owned by the orchestrator and passed into sessions;
//! nothing in the core reads ambient global state.

use std::path::{Path, PathBuf};

use galpack_archive::DEFAULT_PART_SIZE;
use galpack_client::Endpoint;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Persistent configuration, stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where manifests are written and downloads are extracted.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Scratch space for intermediate archives and part files.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Maximum volume size in bytes.
    #[serde(default = "default_part_size")]
    pub max_part_size: u64,

    /// Manifest paths written by previous upload sessions, oldest first.
    #[serde(default)]
    pub upload_history: Vec<PathBuf>,

    /// Upload endpoint settings.
    #[serde(default)]
    pub endpoint: Endpoint,
}

fn default_save_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("galpack")
}

fn default_part_size() -> u64 {
    DEFAULT_PART_SIZE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            work_dir: default_work_dir(),
            max_part_size: default_part_size(),
            upload_history: Vec::new(),
            endpoint: Endpoint::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`.
    ///
    /// A missing file yields the defaults; an unparseable file is reported
    /// and also yields the defaults rather than blocking the session.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Saves the configuration as pretty JSON, creating parent directories
    /// as needed.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
    }
}
