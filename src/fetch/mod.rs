//! Fetch stage: turning item references into persisted files.
//!
//! A worker handles one item end to end (detail page, resolution, streamed
//! download, validation) and never raises: every failure becomes a
//! `DownloadOutcome` reason so one item can't abort its batch.

pub mod headers;
mod scheduler;

pub use scheduler::{FetchEvent, FetchScheduler};

use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::FetchError;
use crate::models::{DownloadOutcome, ItemReference, ResolvedAsset};
use crate::resolver::AssetResolver;

/// Downloads a single resolved item to disk.
pub struct DownloadWorker {
    resolver: AssetResolver,
    min_valid_file_size: u64,
}

impl DownloadWorker {
    pub fn new(min_valid_file_size: u64) -> Self {
        Self {
            resolver: AssetResolver::default(),
            min_valid_file_size,
        }
    }

    /// Fetch one item. `stem` is the extension-less file name; the extension
    /// comes from the asset response's content type.
    pub async fn fetch_item(
        &self,
        client: &Client,
        reference: &ItemReference,
        dest_dir: &Path,
        stem: &str,
    ) -> DownloadOutcome {
        match self.try_fetch(client, reference, dest_dir, stem).await {
            Ok(bytes_written) => DownloadOutcome::ok(reference.clone(), bytes_written),
            Err(err) => {
                debug!("Download failed for {}: {}", reference.url, err);
                DownloadOutcome::failed(reference.clone(), err.kind())
            }
        }
    }

    async fn try_fetch(
        &self,
        client: &Client,
        reference: &ItemReference,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<u64, FetchError> {
        let asset = self.resolve_detail_page(client, reference).await?;

        let response = client
            .get(&asset.asset_url)
            .headers(headers::media_headers(&asset.referer_url))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Upstream(format!(
                "HTTP {} fetching asset",
                status.as_u16()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !is_media_content_type(&content_type) {
            // A 200 with text/html here is almost always a block page.
            return Err(FetchError::Upstream(format!(
                "Unexpected content type: {}",
                content_type
            )));
        }

        let path = dest_dir.join(format!("{}.{}", stem, extension_for(&content_type)));
        stream_to_file(response, &path).await?;
        validate_payload(&path, self.min_valid_file_size).await
    }

    /// Fetch the detail page and run the resolver chain over its markup.
    async fn resolve_detail_page(
        &self,
        client: &Client,
        reference: &ItemReference,
    ) -> Result<ResolvedAsset, FetchError> {
        let response = client
            .get(&reference.url)
            .headers(headers::document_headers())
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Upstream(format!(
                "HTTP {} fetching detail page",
                status.as_u16()
            )));
        }

        let markup = response.text().await?;
        self.resolver
            .resolve(&markup, &reference.url)
            .ok_or(FetchError::Resolution)
    }
}

/// Stream the response body to disk in chunks; the payload is never held in
/// memory whole. A mid-stream fault removes the partial file so a failed
/// outcome never leaves something that looks like a finished download.
async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<(), FetchError> {
    let result = write_chunks(response, path).await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(path).await;
    }
    result
}

async fn write_chunks(response: reqwest::Response, path: &Path) -> Result<(), FetchError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Reject payloads too small to be genuine media, deleting the file.
async fn validate_payload(path: &Path, min_valid_file_size: u64) -> Result<u64, FetchError> {
    let size = tokio::fs::metadata(path).await?.len();
    if size < min_valid_file_size {
        // Best-effort delete: the undersized payload is the reason either way.
        if let Err(err) = tokio::fs::remove_file(path).await {
            debug!("Failed to remove undersized file {}: {}", path.display(), err);
        }
        return Err(FetchError::InvalidPayload { size });
    }
    Ok(size)
}

fn is_media_content_type(content_type: &str) -> bool {
    content_type.contains("video") || content_type.contains("octet-stream")
}

/// File extension for a media content type. mp4 is the safe default; CDNs
/// frequently label media as a generic binary stream.
fn extension_for(content_type: &str) -> &'static str {
    if content_type.contains("webm") {
        "webm"
    } else {
        "mp4"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use crate::error::ErrorKind;

    /// Minimal scripted HTTP server: one response per connection, routed by
    /// request path.
    fn spawn_routes<F>(listener: TcpListener, responder: F)
    where
        F: Fn(&str) -> Vec<u8> + Send + Sync + 'static,
    {
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).into_owned();
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let response = responder(&path);
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            }
        });
    }

    async fn bind() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        (listener, base)
    }

    fn http_response(status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            content_type,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    /// Declares more bytes than it sends, then the connection closes:
    /// the client sees a mid-body transport fault.
    fn truncated_response(content_type: &str, declared_len: usize, body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            content_type, declared_len
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    fn detail_markup(asset_url: &str) -> Vec<u8> {
        format!(r#"<script>{{"playAddr":"{}"}}</script>"#, asset_url).into_bytes()
    }

    #[tokio::test]
    async fn fetch_item_streams_valid_asset_to_disk() {
        let (listener, base) = bind().await;
        let detail = detail_markup(&format!("{}/asset", base));
        spawn_routes(listener, move |path| match path {
            "/detail" => http_response("200 OK", "text/html", &detail),
            "/asset" => http_response("200 OK", "video/mp4", &vec![0u8; 12_000]),
            _ => http_response("404 Not Found", "text/html", b""),
        });

        let tmp = tempfile::tempdir().unwrap();
        let worker = DownloadWorker::new(10_000);
        let reference = ItemReference::new(format!("{}/detail", base));
        let outcome = worker
            .fetch_item(&reqwest::Client::new(), &reference, tmp.path(), "item_1")
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.bytes_written, 12_000);
        let path = tmp.path().join("item_1.mp4");
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 12_000);
    }

    #[tokio::test]
    async fn transport_fault_mid_stream_leaves_no_partial_file() {
        let (listener, base) = bind().await;
        let detail = detail_markup(&format!("{}/asset", base));
        spawn_routes(listener, move |path| match path {
            "/detail" => http_response("200 OK", "text/html", &detail),
            "/asset" => truncated_response("video/mp4", 50_000, &vec![0u8; 20_000]),
            _ => http_response("404 Not Found", "text/html", b""),
        });

        let tmp = tempfile::tempdir().unwrap();
        let worker = DownloadWorker::new(10_000);
        let reference = ItemReference::new(format!("{}/detail", base));
        let outcome = worker
            .fetch_item(&reqwest::Client::new(), &reference, tmp.path(), "item_1")
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.reason, Some(ErrorKind::Transport));
        // A failed outcome must not leave a partial payload behind.
        assert!(!tmp.path().join("item_1.mp4").exists());
    }

    #[tokio::test]
    async fn block_page_asset_is_rejected_before_any_write() {
        let (listener, base) = bind().await;
        let detail = detail_markup(&format!("{}/asset", base));
        spawn_routes(listener, move |path| match path {
            "/detail" => http_response("200 OK", "text/html", &detail),
            // 200 with an HTML body: a block page, not media.
            "/asset" => http_response("200 OK", "text/html; charset=utf-8", &vec![b'x'; 20_000]),
            _ => http_response("404 Not Found", "text/html", b""),
        });

        let tmp = tempfile::tempdir().unwrap();
        let worker = DownloadWorker::new(10_000);
        let reference = ItemReference::new(format!("{}/detail", base));
        let outcome = worker
            .fetch_item(&reqwest::Client::new(), &reference, tmp.path(), "item_1")
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.reason, Some(ErrorKind::Upstream));
        assert!(std::fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn non_200_detail_page_fails_as_upstream() {
        let (listener, base) = bind().await;
        spawn_routes(listener, move |_path| {
            http_response("403 Forbidden", "text/html", b"blocked")
        });

        let tmp = tempfile::tempdir().unwrap();
        let worker = DownloadWorker::new(10_000);
        let reference = ItemReference::new(format!("{}/detail", base));
        let outcome = worker
            .fetch_item(&reqwest::Client::new(), &reference, tmp.path(), "item_1")
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.reason, Some(ErrorKind::Upstream));
    }

    #[tokio::test]
    async fn unresolvable_detail_page_fails_as_resolution() {
        let (listener, base) = bind().await;
        spawn_routes(listener, move |_path| {
            http_response("200 OK", "text/html", b"<html><h1>Nothing embedded</h1></html>")
        });

        let tmp = tempfile::tempdir().unwrap();
        let worker = DownloadWorker::new(10_000);
        let reference = ItemReference::new(format!("{}/detail", base));
        let outcome = worker
            .fetch_item(&reqwest::Client::new(), &reference, tmp.path(), "item_1")
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.reason, Some(ErrorKind::Resolution));
    }

    #[tokio::test]
    async fn undersized_payload_is_deleted_and_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("item_1.mp4");
        tokio::fs::write(&path, b"<html>blocked</html>").await.unwrap();

        let err = validate_payload(&path, 10_000).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidPayload { size: 20 }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn payload_at_threshold_survives() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("item_2.mp4");
        tokio::fs::write(&path, vec![0u8; 10_000]).await.unwrap();

        let size = validate_payload(&path, 10_000).await.unwrap();
        assert_eq!(size, 10_000);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn failed_deletion_still_reports_invalid_payload() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory at the path makes remove_file fail; the reported
        // reason must stay InvalidPayload, not the deletion's io error.
        let path = tmp.path().join("item_3.mp4");
        tokio::fs::create_dir(&path).await.unwrap();

        let err = validate_payload(&path, 10_000).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidPayload { .. }));
        assert!(path.exists());
    }

    #[test]
    fn media_content_types_accepted() {
        assert!(is_media_content_type("video/mp4"));
        assert!(is_media_content_type("application/octet-stream"));
        assert!(!is_media_content_type("text/html; charset=utf-8"));
        assert!(!is_media_content_type(""));
    }

    #[test]
    fn extension_follows_content_type() {
        assert_eq!(extension_for("video/webm"), "webm");
        assert_eq!(extension_for("video/mp4"), "mp4");
        assert_eq!(extension_for("application/octet-stream"), "mp4");
    }
}
