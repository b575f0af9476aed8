//! Manifest data model.

use serde::{Deserialize, Serialize};

/// Timestamp format used in `upload_date`.
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One volume of a split archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Zero-based reconstruction order, unique within a manifest.
    pub index: u32,
    /// File name of the part as produced by the partitioner.
    pub title: String,
    /// Remote reference: the server-issued file id (URL-shaped).
    pub path: String,
    /// Content digest of the part's bytes, computed at upload time.
    pub md5: String,
    /// Exact byte length of the part.
    pub size: u64,
}

/// Durable record of one archived unit and its uploaded volumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Logical name, derived from the source directory.
    pub game_title: String,
    /// Human-readable completion timestamp.
    pub upload_date: String,
    /// Volumes, kept in ascending `index` order.
    pub volumes: Vec<Volume>,
}

impl Manifest {
    /// Creates a manifest stamped with the current local time.
    pub fn new(game_title: impl Into<String>, volumes: Vec<Volume>) -> Self {
        Self {
            game_title: game_title.into(),
            upload_date: chrono::Local::now().format(DATE_FORMAT).to_string(),
            volumes,
        }
    }

    /// Total byte size across all volumes.
    pub fn total_size(&self) -> u64 {
        self.volumes.iter().map(|v| v.size).sum()
    }
}
