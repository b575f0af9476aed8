//! Volume manifest model and persistence.
//!
//! A manifest is the sole durable link between an upload session and a
//! later download: it names the archived unit and lists every volume with
//! its remote reference, digest and size. Written exactly once, after all
//! volumes have uploaded; immutable from then on.

mod store;
mod types;

pub use store::{load_manifest, save_manifest};
pub use types::{Manifest, Volume};

/// Errors produced by manifest persistence.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed manifest: {0}")]
    Format(String),
}
