//! Streaming download of one part by remote reference.

use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{ClientError, percent};

/// Downloads `remote_ref` (a URL-shaped file id) to `dest`.
///
/// Bytes stream to disk in bounded chunks. Progress is computed against the
/// `Content-Length` header when the server sends one; without it only the
/// final 100 is reported. On any failure the partially written destination
/// is removed so a later merge can never pick up a truncated part.
pub async fn download_part<F>(
    http: &reqwest::Client,
    remote_ref: &str,
    dest: &Path,
    progress: F,
) -> Result<u64, ClientError>
where
    F: Fn(u8) + Send + Sync,
{
    match stream_to_disk(http, remote_ref, dest, &progress).await {
        Ok(size) => {
            progress(100);
            debug!(remote = %remote_ref, size, dest = %dest.display(), "part downloaded");
            Ok(size)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(dest).await;
            Err(e)
        }
    }
}

async fn stream_to_disk<F>(
    http: &reqwest::Client,
    remote_ref: &str,
    dest: &Path,
    progress: &F,
) -> Result<u64, ClientError>
where
    F: Fn(u8) + Send + Sync,
{
    let mut resp = http.get(remote_ref).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let total = resp.content_length();
    let mut file = tokio::fs::File::create(dest).await?;
    let mut downloaded: u64 = 0;

    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        if let Some(total) = total {
            progress(percent(downloaded, total));
        }
    }
    file.flush().await?;
    Ok(downloaded)
}
