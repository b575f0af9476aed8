//! HTTP transfer client for split-archive volumes.
//!
//! Stateless upload and download against the file-hosting endpoint. Every
//! call is given everything it needs (the HTTP client, the endpoint and a
//! progress callback) and retains nothing between calls.

mod digest;
mod download;
mod upload;

pub use digest::{file_md5, md5_hex};
pub use download::download_part;
pub use upload::{UploadedPart, upload_part};

/// Default upload service root.
pub const DEFAULT_BASE_URL: &str = "http://filesoss.yunzuoye.net/XHFileServer/file/upload";

/// Default namespace segment under the upload root.
pub const DEFAULT_NAMESPACE: &str = "CA104004";

/// Upload endpoint: a base URL plus a namespace. The part's content digest
/// completes the placement key.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Endpoint {
    pub base_url: String,
    pub namespace: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            namespace: DEFAULT_NAMESPACE.into(),
        }
    }
}

impl Endpoint {
    /// URL a part with the given digest is uploaded to.
    ///
    /// Identical content maps to the same location, so re-uploading a part
    /// the server has already seen deduplicates on the server side.
    pub fn upload_url(&self, digest: &str) -> String {
        format!(
            "{}/{}/{digest}",
            self.base_url.trim_end_matches('/'),
            self.namespace
        )
    }
}

/// Errors produced by the transfer client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response body missing uploadFileDTO.fileId")]
    MissingFileId,
}

/// Percentage of `done` out of `total`, clamped to 0–100.
pub(crate) fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        100
    } else {
        (done.saturating_mul(100) / total).min(100) as u8
    }
}
