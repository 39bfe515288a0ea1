//! Response bodies: manifests, segment bytes and held-open failures.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::stream;
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;

use super::error::SimError;

pub const MANIFEST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Serve manifest text. Live playlists change on every poll, so never cache.
pub fn manifest(m3u8: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, MANIFEST_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        m3u8,
    )
        .into_response()
}

/// Immediate injected server error.
pub fn server_error(message: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}

/// Send `200 OK` headers now and the body only after `delay`.
///
/// The body is a lazy stream, so if the client hangs up first hyper drops
/// it and the delayed write never happens.
pub fn held_open(delay: Duration, message: String) -> Response {
    let body = stream::once(async move {
        tokio::time::sleep(delay).await;
        Ok::<_, std::io::Error>(Bytes::from(message))
    });

    (
        [(header::CONTENT_TYPE, "text/plain")],
        Body::from_stream(body),
    )
        .into_response()
}

/// Stream a segment file unmodified.
pub async fn stream_file(path: &Path) -> Result<Response, SimError> {
    let file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SimError::SourceNotFound(path.display().to_string()),
        _ => SimError::Io(e),
    })?;

    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(SimError::SourceNotFound(path.display().to_string()));
    }

    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        [
            (header::CONTENT_TYPE, content_type(path).to_string()),
            (header::CONTENT_LENGTH, metadata.len().to_string()),
        ],
        body,
    )
        .into_response())
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("aac") => "audio/aac",
        Some("ts") => "video/mp2t",
        Some("m4s") | Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}
