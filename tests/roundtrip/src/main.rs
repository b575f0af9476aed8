fn main() {
    println!("Run `cargo test -p session-roundtrip` to execute end-to-end session tests.");
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use galpack_client::{Endpoint, md5_hex};
    use galpack_manifest::load_manifest;
    use galpack_pipeline::{AppConfig, NullObserver, Orchestrator, PipelineError, Step};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Uploaded part bodies, keyed by the digest segment of the upload URL.
    type FileStore = Arc<Mutex<HashMap<String, Vec<u8>>>>;

    #[derive(Clone, Copy)]
    enum ServerMode {
        /// Store uploads and serve them back on GET.
        Normal,
        /// Accept uploads but answer without `uploadFileDTO.fileId`.
        MissingFileId,
    }

    /// Starts a loopback file server speaking just enough HTTP for the
    /// transfer client: POST stores the multipart payload under the digest
    /// from the URL and answers with a `fileId` download URL; GET serves the
    /// stored bytes with a `Content-Length`.
    async fn spawn_server(mode: ServerMode) -> (String, FileStore) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = format!("http://{addr}");
        let store: FileStore = Arc::new(Mutex::new(HashMap::new()));

        let task_store = Arc::clone(&store);
        let task_base = base.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let store = Arc::clone(&task_store);
                let base = task_base.clone();
                tokio::spawn(async move {
                    handle_connection(&mut stream, store, &base, mode).await;
                });
            }
        });

        (base, store)
    }

    async fn handle_connection(stream: &mut TcpStream, store: FileStore, base: &str, mode: ServerMode) {
        let Some((head, body)) = read_request(stream).await else {
            return;
        };
        let request_line = head.lines().next().unwrap_or_default();
        let mut pieces = request_line.split_whitespace();
        let method = pieces.next().unwrap_or_default();
        let path = pieces.next().unwrap_or_default();

        match method {
            "POST" => match mode {
                ServerMode::Normal => {
                    let digest = path.rsplit('/').next().unwrap_or_default().to_string();
                    let Some(payload) = multipart_payload(&head, &body) else {
                        write_response(stream, 400, "text/plain", b"bad multipart body").await;
                        return;
                    };
                    store.lock().unwrap().insert(digest.clone(), payload);
                    let reply =
                        format!(r#"{{"uploadFileDTO":{{"fileId":"{base}/files/{digest}"}}}}"#);
                    write_response(stream, 200, "application/json", reply.as_bytes()).await;
                }
                ServerMode::MissingFileId => {
                    write_response(stream, 200, "application/json", br#"{"uploadFileDTO":{}}"#)
                        .await;
                }
            },
            "GET" => {
                let digest = path.rsplit('/').next().unwrap_or_default();
                let data = store.lock().unwrap().get(digest).cloned();
                match data {
                    Some(bytes) => {
                        write_response(stream, 200, "application/octet-stream", &bytes).await
                    }
                    None => write_response(stream, 404, "text/plain", b"not found").await,
                }
            }
            _ => write_response(stream, 405, "text/plain", b"method not allowed").await,
        }
    }

    /// Reads one request: head until the blank line, then `Content-Length`
    /// bytes of body.
    async fn read_request(stream: &mut TcpStream) -> Option<(String, Vec<u8>)> {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 16 * 1024];
        let header_end = loop {
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos;
            }
            let n = stream.read(&mut tmp).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&tmp[..n]);
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);

        let mut body = buf[header_end + 4..].to_vec();
        while body.len() < content_length {
            let n = stream.read(&mut tmp).await.ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&tmp[..n]);
        }
        Some((head, body))
    }

    /// Extracts the file bytes of a single-part multipart body: everything
    /// between the part's header terminator and the closing boundary.
    fn multipart_payload(head: &str, body: &[u8]) -> Option<Vec<u8>> {
        let boundary = head.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if !name.eq_ignore_ascii_case("content-type") {
                return None;
            }
            value
                .split("boundary=")
                .nth(1)
                .map(|b| b.trim().trim_matches('"').to_string())
        })?;

        let data_start = find(body, b"\r\n\r\n")? + 4;
        let closing = format!("\r\n--{boundary}--");
        let data_end = rfind(body, closing.as_bytes())?;
        (data_end >= data_start).then(|| body[data_start..data_end].to_vec())
    }

    async fn write_response(stream: &mut TcpStream, status: u16, content_type: &str, body: &[u8]) {
        let reason = match status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            _ => "Error",
        };
        let head = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let _ = stream.write_all(head.as_bytes()).await;
        let _ = stream.write_all(body).await;
        let _ = stream.shutdown().await;
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).rposition(|w| w == needle)
    }

    // -----------------------------------------------------------------------
    // Fixtures
    // -----------------------------------------------------------------------

    /// Never-zero patterned filler so merged archives can't alias tar
    /// padding.
    fn filler(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8 + 1).collect()
    }

    fn create_source_tree(root: &Path) -> PathBuf {
        let source = root.join("Starlight");
        std::fs::create_dir_all(source.join("data").join("levels")).unwrap();
        std::fs::write(source.join("game.bin"), filler(300 * 1024)).unwrap();
        std::fs::write(source.join("readme.txt"), b"how to play").unwrap();
        std::fs::write(source.join("empty.dat"), b"").unwrap();
        std::fs::write(source.join("data").join("config.ini"), b"fullscreen=1").unwrap();
        std::fs::write(source.join("data").join("levels").join("l1.map"), filler(2048)).unwrap();
        source
    }

    fn test_config(root: &Path, base: &str) -> AppConfig {
        AppConfig {
            save_dir: root.join("saves"),
            work_dir: root.join("work"),
            // Small parts so the archive spans several volumes.
            max_part_size: 64 * 1024,
            upload_history: Vec::new(),
            endpoint: Endpoint {
                base_url: format!("{base}/XHFileServer/file/upload"),
                namespace: "CA104004".into(),
            },
        }
    }

    /// Collects every file under `root` as relative path -> bytes.
    fn snapshot_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
        fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
            for entry in std::fs::read_dir(dir).unwrap() {
                let entry = entry.unwrap();
                let path = entry.path();
                if path.is_dir() {
                    walk(root, &path, out);
                } else {
                    let rel = path
                        .strip_prefix(root)
                        .unwrap()
                        .to_string_lossy()
                        .replace('\\', "/");
                    out.insert(rel, std::fs::read(&path).unwrap());
                }
            }
        }
        let mut out = BTreeMap::new();
        walk(root, root, &mut out);
        out
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn upload_then_download_reproduces_the_tree() {
        let (base, store) = spawn_server(ServerMode::Normal).await;
        let root = tempfile::tempdir().unwrap();
        let source = create_source_tree(root.path());
        let config = test_config(root.path(), &base);

        let mut uploader = Orchestrator::new(config.clone(), Arc::new(NullObserver));
        let upload = uploader.upload(&source).await.unwrap();

        assert!(upload.manifest_path.exists());
        assert!(upload.volumes > 1, "fixture should span several volumes");

        // Every stored body hashes to the digest it was placed under.
        {
            let store = store.lock().unwrap();
            assert_eq!(store.len(), upload.volumes);
            for (digest, bytes) in store.iter() {
                assert_eq!(&md5_hex(bytes), digest);
            }
        }

        // Manifest invariants: title, contiguous indices, sizes bounded.
        let manifest = load_manifest(&upload.manifest_path).unwrap();
        assert_eq!(manifest.game_title, "Starlight");
        for (i, volume) in manifest.volumes.iter().enumerate() {
            assert_eq!(volume.index, i as u32);
            assert!(volume.size <= config.max_part_size);
            assert!(volume.path.starts_with(&base));
        }

        // Upload scratch space was cleaned.
        assert!(!config.work_dir.join("Starlight").exists());

        // A fresh session, driven only by the manifest.
        let mut downloader = Orchestrator::new(config.clone(), Arc::new(NullObserver));
        let download = downloader.download(&upload.manifest_path).await.unwrap();

        assert_eq!(download.volumes, upload.volumes);
        assert_eq!(snapshot_tree(&source), snapshot_tree(&download.target_dir));

        // Download intermediates were cleaned too.
        assert!(!config.work_dir.join("Starlight").join("Starlight.tar").exists());
    }

    #[tokio::test]
    async fn download_follows_index_order_not_manifest_order() {
        let (base, _store) = spawn_server(ServerMode::Normal).await;
        let root = tempfile::tempdir().unwrap();
        let source = create_source_tree(root.path());
        let config = test_config(root.path(), &base);

        let mut uploader = Orchestrator::new(config.clone(), Arc::new(NullObserver));
        let upload = uploader.upload(&source).await.unwrap();

        // Reverse the volumes array on disk; reassembly must still follow
        // the index field.
        let mut json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&upload.manifest_path).unwrap())
                .unwrap();
        let volumes = json["volumes"].as_array_mut().unwrap();
        assert!(volumes.len() > 1);
        volumes.reverse();
        std::fs::write(&upload.manifest_path, serde_json::to_string(&json).unwrap()).unwrap();

        let mut downloader = Orchestrator::new(config.clone(), Arc::new(NullObserver));
        let download = downloader.download(&upload.manifest_path).await.unwrap();

        assert_eq!(snapshot_tree(&source), snapshot_tree(&download.target_dir));
    }

    #[tokio::test]
    async fn missing_file_id_halts_upload_before_the_manifest() {
        let (base, _store) = spawn_server(ServerMode::MissingFileId).await;
        let root = tempfile::tempdir().unwrap();
        let source = create_source_tree(root.path());
        let config = test_config(root.path(), &base);
        let save_dir = config.save_dir.clone();

        let mut uploader = Orchestrator::new(config, Arc::new(NullObserver));
        let err = uploader.upload(&source).await.unwrap_err();

        assert_eq!(err.step(), Step::Uploading);
        match err {
            PipelineError::Uploading { index, source } => {
                assert_eq!(index, 0);
                assert!(matches!(
                    source,
                    galpack_client::ClientError::MissingFileId
                ));
            }
            other => panic!("expected Uploading error, got {other:?}"),
        }
        assert!(!save_dir.join("Starlight.json").exists());
    }
}
