//! Multipart upload of one part file.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::TryStreamExt;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::{ClientError, Endpoint, digest, percent};

/// Multipart field name the server expects the file under.
const FILE_FIELD: &str = "files";

/// Server-side folder hint, partitioned by upload date.
const FOLDER_PREFIX: &str = "yunketang";

/// Result of a successful part upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPart {
    /// Server-issued identifier, resolvable to a download URL.
    pub file_id: String,
    /// MD5 hex digest the part was placed under.
    pub digest: String,
    /// Exact byte length streamed.
    pub size: u64,
}

/// Upload response envelope: `{"uploadFileDTO": {"fileId": "..."}}`.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "uploadFileDTO")]
    upload_file_dto: Option<UploadFileDto>,
}

#[derive(Debug, Deserialize)]
struct UploadFileDto {
    #[serde(rename = "fileId")]
    file_id: Option<String>,
}

/// Uploads one part file, reporting progress as bytes stream out.
///
/// The part's MD5 is computed first; it doubles as the remote placement key
/// and goes out in the `XueHai-MD5` header. `progress` receives
/// monotonically non-decreasing percentages from 0 to 100. A network
/// failure, a non-success status, or a response without
/// `uploadFileDTO.fileId` each abort the call as a distinct error, with no
/// retry and no credit for partially streamed bytes.
pub async fn upload_part<F>(
    http: &reqwest::Client,
    endpoint: &Endpoint,
    path: &Path,
    progress: F,
) -> Result<UploadedPart, ClientError>
where
    F: Fn(u8) + Send + Sync + 'static,
{
    let digest = digest::file_md5(path)?;

    let file = tokio::fs::File::open(path).await?;
    let size = file.metadata().await?.len();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "part".into());

    let progress = Arc::new(progress);
    (*progress)(0);

    let sent = Arc::new(AtomicU64::new(0));
    let stream = ReaderStream::new(file).inspect_ok({
        let sent = Arc::clone(&sent);
        let progress = Arc::clone(&progress);
        move |chunk| {
            let done = sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
            (*progress)(percent(done, size));
        }
    });

    let part = reqwest::multipart::Part::stream_with_length(reqwest::Body::wrap_stream(stream), size)
        .file_name(file_name.clone())
        .mime_str("application/octet-stream")?;
    let form = reqwest::multipart::Form::new().part(FILE_FIELD, part);

    let folder = format!("{FOLDER_PREFIX}/{}", chrono::Local::now().format("%Y%m%d"));
    let resp = http
        .post(endpoint.upload_url(&digest))
        .header("XueHai-MD5", digest.as_str())
        .header("Folder", folder)
        .multipart(form)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let body = resp.bytes().await?;
    let parsed: UploadResponse = serde_json::from_slice(&body)?;
    let file_id = parsed
        .upload_file_dto
        .and_then(|dto| dto.file_id)
        .ok_or(ClientError::MissingFileId)?;

    (*progress)(100);
    debug!(file = %file_name, %file_id, size, "part uploaded");

    Ok(UploadedPart {
        file_id,
        digest,
        size,
    })
}
