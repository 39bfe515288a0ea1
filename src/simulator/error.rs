//! Simulator errors and their HTTP mapping.
//!
//! Injected faults are not errors; they are ordinary responses built by the
//! dispatcher. Only genuine failures of the simulator end up here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Segment requested for a track whose manifest was never served.
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Manifest or segment file missing from the streams directory.
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Invalid source playlist {path}: {source}")]
    Playlist {
        path: String,
        #[source]
        source: livesim_media::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TrackNotFound(_) | Self::SourceNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Self::Playlist { .. } | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::TrackNotFound(_) => "track_not_found",
            Self::InvalidPath(_) => "invalid_path",
            Self::SourceNotFound(_) => "source_not_found",
            Self::Playlist { .. } => "invalid_playlist",
            Self::Io(_) => "io_error",
        }
    }
}

impl IntoResponse for SimError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Simulator error");
        } else {
            tracing::warn!(status = %status, error = %self, "Rejected simulator request");
        }

        let body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
