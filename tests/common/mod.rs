//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which lays out a temporary streams directory
//! with a looped source manifest and its segment files, and builds the full
//! router on top of a fresh [`AppContext`].

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use livesim::config::{Config, SimulatorConfig};
use livesim::server::{create_router, AppContext};
use tempfile::TempDir;
use tower::ServiceExt;

/// Source manifest with segments of 2, 3 and 5 seconds.
pub const RADIO_M3U8: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:5
#EXTINF:2.0,
seg0.mp3
#EXTINF:3.0,
seg1.mp3
#EXTINF:5.0,
seg2.mp3
#EXT-X-ENDLIST
";

pub const MANIFEST: &str = "/local/t1/radio/playlist.m3u8";
pub const SEGMENT: &str = "/local/t1/radio/seg0.mp3";
pub const HOLD_OPEN_SECS: u64 = 60;

pub struct TestHarness {
    pub ctx: AppContext,
    pub app: Router,
    _streams: TempDir,
}

impl TestHarness {
    /// Harness with no lookahead, so windows depend on elapsed time only.
    pub fn new() -> Self {
        Self::with_lookahead(0)
    }

    pub fn with_lookahead(lookahead_ms: u64) -> Self {
        let streams = tempfile::tempdir().expect("failed to create streams dir");

        let radio = streams.path().join("radio");
        std::fs::create_dir_all(&radio).unwrap();
        std::fs::write(radio.join("playlist.m3u8"), RADIO_M3U8).unwrap();
        for i in 0..3u8 {
            std::fs::write(radio.join(format!("seg{i}.mp3")), segment_bytes(i)).unwrap();
        }

        let broken = streams.path().join("broken");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join("playlist.m3u8"), "#EXTINF:2,\nseg0.mp3\n").unwrap();

        let config = Config {
            server: Default::default(),
            simulator: SimulatorConfig {
                streams_dir: streams.path().to_path_buf(),
                route_prefix: "local".to_string(),
                lookahead_ms,
                hold_open_secs: HOLD_OPEN_SECS,
            },
        };

        let ctx = AppContext::new(config);
        let app = create_router(ctx.clone());

        Self {
            ctx,
            app,
            _streams: streams,
        }
    }

    /// Issue a GET and return status, headers and the unread body.
    pub async fn get(&self, uri: &str) -> (StatusCode, HeaderMap, Body) {
        let response = self
            .app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        (status, headers, response.into_body())
    }

    /// Issue a GET and read the whole body as text.
    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let (status, _, body) = self.get(uri).await;
        (status, body_to_string(body).await)
    }
}

/// Deterministic contents of `seg{i}.mp3`.
pub fn segment_bytes(i: u8) -> Vec<u8> {
    (0..=255u8).cycle().skip(i as usize).take(1000 + i as usize).collect()
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Number of segment entries in a manifest.
pub fn segment_count(m3u8: &str) -> usize {
    m3u8.lines().filter(|line| line.starts_with("#EXTINF")).count()
}
