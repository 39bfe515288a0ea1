//! Live playlist simulator.
//!
//! Serves a time-advancing live window over static source manifests and
//! injects faults on demand so client recovery logic can be exercised.
//!
//! # Routes
//!
//! All routes live under a configurable prefix (default `local`):
//! - `GET /local/{track}/action?stop=true|timeout=true|mp3error=true|reset=true` - Control a track
//! - `GET /local/{track}/{path}.m3u8[?vod=true|hlserror=true|timeout=true]` - Live manifest
//! - `GET /local/{track}/{path}` - Segment bytes, subject to pending faults
//!
//! `{path}` is resolved against the streams directory; the track id only
//! selects the simulated timeline.

mod dispatch;
mod error;
pub mod faults;
mod sender;
pub mod store;

pub use dispatch::{handle, QueryFlags, SimRequest};
pub use error::SimError;
pub use faults::{FaultAction, SegmentFault};
pub use store::{TrackSnapshot, TrackState, TrackStore};

use axum::{routing::get, Router};

use crate::server::AppContext;

/// Create the simulator router for the given route prefix.
pub fn sim_router(prefix: &str) -> Router<AppContext> {
    Router::new().route(&format!("/{prefix}/{{*path}}"), get(handle))
}
