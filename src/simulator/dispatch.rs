//! Request classification and handling.
//!
//! Every simulated route has the shape `/<prefix>/<track>/<rest...>`. The
//! track id is the first component after the prefix; `rest` is the file
//! path inside the streams directory, or `action` for control requests.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::collections::HashMap;

use super::error::SimError;
use super::faults::{self, FaultAction, SegmentFault};
use super::sender;
use crate::server::AppContext;

const ACTION_COMPONENT: &str = "action";
const MANIFEST_EXTENSION: &str = ".m3u8";

/// A simulated request, classified by path shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimRequest {
    /// `/<track>/action?...`
    Action { track: String },
    /// `/<track>/<path>.m3u8`
    Manifest { track: String, path: String },
    /// `/<track>/<path>`, any other file
    Segment { track: String, path: String },
}

impl SimRequest {
    /// Classify the part of the request path after the route prefix.
    pub fn classify(path: &str) -> Result<Self, SimError> {
        let components: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        if components
            .iter()
            .any(|c| c.is_empty() || *c == "." || *c == ".." || c.contains('\\'))
        {
            return Err(SimError::InvalidPath(path.to_string()));
        }

        let (track, rest) = match components.split_first() {
            Some((track, rest)) if !rest.is_empty() => (track.to_string(), rest),
            _ => return Err(SimError::InvalidPath(path.to_string())),
        };

        let last = rest[rest.len() - 1];
        let path = rest.join("/");

        Ok(if last == ACTION_COMPONENT {
            Self::Action { track }
        } else if last.ends_with(MANIFEST_EXTENSION) {
            Self::Manifest { track, path }
        } else {
            Self::Segment { track, path }
        })
    }

    /// Track id the request addresses.
    pub fn track(&self) -> &str {
        match self {
            Self::Action { track } | Self::Manifest { track, .. } | Self::Segment { track, .. } => {
                track
            }
        }
    }
}

/// Query flags of a simulated request. A flag is set when its value is `true`.
#[derive(Debug, Clone, Default)]
pub struct QueryFlags(HashMap<String, String>);

impl QueryFlags {
    pub fn is_set(&self, name: &str) -> bool {
        self.0.get(name).is_some_and(|value| value == "true")
    }
}

impl From<HashMap<String, String>> for QueryFlags {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

/// Entry point for every route under the simulator prefix.
pub async fn handle(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, SimError> {
    let request = SimRequest::classify(&path)?;
    let flags = QueryFlags::from(query);

    tracing::debug!(track = request.track(), ?request, "Simulator request");

    match request {
        SimRequest::Action { track } => Ok(handle_action(&ctx, &track, &flags)),
        SimRequest::Manifest { track, path } => handle_manifest(&ctx, &track, &path, &flags).await,
        SimRequest::Segment { track, path } => handle_segment(&ctx, &track, &path).await,
    }
}

/// Apply a control action. Always acknowledged, even for unknown tracks.
fn handle_action(ctx: &AppContext, track: &str, flags: &QueryFlags) -> Response {
    let now = Utc::now();

    let applied = match FaultAction::from_flags(|name| flags.is_set(name)) {
        Some(action) => ctx
            .tracks
            .with_track(track, |state| {
                faults::apply(state, action, now);
                tracing::info!(
                    track = %track,
                    ?action,
                    pending_timeouts = state.pending_timeouts,
                    pending_errors = state.pending_errors,
                    "Applied control action"
                );
            })
            .is_some(),
        None if flags.is_set("reset") => ctx.tracks.reset(track),
        None => ctx.tracks.contains(track),
    };

    if applied {
        format!("{track} action performed").into_response()
    } else {
        tracing::debug!(track = %track, "Ignored control action");
        ().into_response()
    }
}

/// Serve the manifest, creating the track on first request.
async fn handle_manifest(
    ctx: &AppContext,
    track: &str,
    path: &str,
    flags: &QueryFlags,
) -> Result<Response, SimError> {
    let source = ctx.source_path(path);
    let state = ctx.tracks.get_or_create(track, &source, Utc::now()).await?;

    if flags.is_set("vod") {
        return Ok(sender::manifest(state.playlist.render_static()));
    }

    if flags.is_set("hlserror") {
        tracing::info!(track = %track, "Forced manifest error");
        return Ok(sender::server_error("Fail".to_string()));
    }

    if flags.is_set("timeout") {
        tracing::info!(track = %track, "Forced manifest timeout");
        return Ok(sender::held_open(ctx.hold_open(), "Fail".to_string()));
    }

    let m3u8 = state.window(ctx.lookahead()).render(Utc::now());
    Ok(sender::manifest(m3u8))
}

/// Serve a segment, consuming one pending fault if there is any.
async fn handle_segment(ctx: &AppContext, track: &str, path: &str) -> Result<Response, SimError> {
    let fault = ctx
        .tracks
        .with_track(track, faults::take_segment_fault)
        .ok_or_else(|| SimError::TrackNotFound(track.to_string()))?;

    match fault {
        Some(SegmentFault::HoldOpen { remaining }) => {
            tracing::info!(track = %track, segment = %path, remaining, "Holding segment open");
            Ok(sender::held_open(
                ctx.hold_open(),
                format!("timeoutcount {remaining}"),
            ))
        }
        Some(SegmentFault::ServerError { remaining }) => {
            tracing::info!(track = %track, segment = %path, remaining, "Failing segment");
            Ok(sender::server_error(format!("failcount {remaining}")))
        }
        None => sender::stream_file(&ctx.source_path(path)).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_action() {
        assert_eq!(
            SimRequest::classify("track1/action").unwrap(),
            SimRequest::Action {
                track: "track1".into()
            }
        );
    }

    #[test]
    fn test_classify_manifest() {
        let request = SimRequest::classify("track1/radio/playlist.m3u8").unwrap();
        assert_eq!(
            request,
            SimRequest::Manifest {
                track: "track1".into(),
                path: "radio/playlist.m3u8".into()
            }
        );
        assert_eq!(request.track(), "track1");
    }

    #[test]
    fn test_classify_segment() {
        assert_eq!(
            SimRequest::classify("t/radio/seg0.mp3").unwrap(),
            SimRequest::Segment {
                track: "t".into(),
                path: "radio/seg0.mp3".into()
            }
        );
    }

    #[test]
    fn test_classify_rejects_bad_paths() {
        for path in ["", "track", "track/", "t/../secret.mp3", "t//a.mp3", "t/./a.m3u8", "t/a\\..\\b.mp3"] {
            assert!(
                matches!(SimRequest::classify(path), Err(SimError::InvalidPath(_))),
                "{path:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_query_flags() {
        let flags = QueryFlags::from(HashMap::from([
            ("stop".to_string(), "true".to_string()),
            ("vod".to_string(), "1".to_string()),
        ]));

        assert!(flags.is_set("stop"));
        assert!(!flags.is_set("vod"));
        assert!(!flags.is_set("timeout"));
    }
}
