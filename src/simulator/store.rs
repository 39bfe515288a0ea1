//! Per-track simulation state.
//!
//! A track is created on its first manifest request and lives until the
//! process exits or it is reset through the control endpoint. The store is
//! the only owner of [`TrackState`]; handlers look tracks up by id on every
//! request and mutate them inside a single map-entry critical section, so
//! one track never sees two interleaved mutations.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use livesim_media::{LiveWindow, SourcePlaylist};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::error::SimError;

/// Simulation state of one track.
#[derive(Debug, Clone)]
pub struct TrackState {
    /// When the first manifest was served; origin of the live timeline.
    pub start_time: DateTime<Utc>,
    /// Set once by a stop action; freezes the window.
    pub stop_time: Option<DateTime<Utc>>,
    /// Segment requests still to be held open.
    pub pending_timeouts: u32,
    /// Segment requests still to be answered with a server error.
    pub pending_errors: u32,
    /// Parsed source, replayed in a loop.
    pub playlist: Arc<SourcePlaylist>,
}

impl TrackState {
    pub fn new(playlist: SourcePlaylist, now: DateTime<Utc>) -> Self {
        Self {
            start_time: now,
            stop_time: None,
            pending_timeouts: 0,
            pending_errors: 0,
            playlist: Arc::new(playlist),
        }
    }

    /// Live window over this track's source.
    pub fn window(&self, lookahead: TimeDelta) -> LiveWindow<'_> {
        LiveWindow::new(&self.playlist, self.start_time)
            .stopped_at(self.stop_time)
            .with_lookahead(lookahead)
    }
}

/// Serializable view of a track, for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSnapshot {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub stop_time: Option<DateTime<Utc>>,
    pub pending_timeouts: u32,
    pub pending_errors: u32,
    pub segment_count: usize,
}

/// Thread-safe map from track id to [`TrackState`].
#[derive(Debug, Clone, Default)]
pub struct TrackStore {
    tracks: Arc<DashMap<String, TrackState>>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the track, creating it from the manifest at `source` if needed.
    ///
    /// The manifest is only read and parsed when the track does not exist
    /// yet. If two first requests race, the first insert wins and both see
    /// the same start time.
    pub async fn get_or_create(
        &self,
        track_id: &str,
        source: &Path,
        now: DateTime<Utc>,
    ) -> Result<TrackState, SimError> {
        if let Some(state) = self.get(track_id) {
            return Ok(state);
        }

        let text = tokio::fs::read_to_string(source)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    SimError::SourceNotFound(source.display().to_string())
                }
                _ => SimError::Io(e),
            })?;

        self.get_or_insert_with(track_id, now, || {
            livesim_media::hls::parse(&text).map_err(|source_err| SimError::Playlist {
                path: source.display().to_string(),
                source: source_err,
            })
        })
    }

    /// Return the track, creating it with `parse` if it does not exist.
    /// A failing `parse` leaves the store unchanged.
    pub fn get_or_insert_with<F>(
        &self,
        track_id: &str,
        now: DateTime<Utc>,
        parse: F,
    ) -> Result<TrackState, SimError>
    where
        F: FnOnce() -> Result<SourcePlaylist, SimError>,
    {
        match self.tracks.entry(track_id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let playlist = parse()?;
                tracing::info!(
                    track = %track_id,
                    segments = playlist.segments.len(),
                    cycle_secs = playlist.cycle_duration(),
                    first_segment = playlist.segments.first().and_then(|s| s.uri()),
                    "Created track"
                );
                Ok(entry.insert(TrackState::new(playlist, now)).value().clone())
            }
        }
    }

    pub fn get(&self, track_id: &str) -> Option<TrackState> {
        self.tracks.get(track_id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.tracks.contains_key(track_id)
    }

    /// Run `f` on the track's state under its entry lock.
    ///
    /// Returns `None` if the track does not exist.
    pub fn with_track<R>(&self, track_id: &str, f: impl FnOnce(&mut TrackState) -> R) -> Option<R> {
        self.tracks
            .get_mut(track_id)
            .map(|mut entry| f(entry.value_mut()))
    }

    /// Forget a track so its next manifest request starts a new timeline.
    pub fn reset(&self, track_id: &str) -> bool {
        let removed = self.tracks.remove(track_id).is_some();
        if removed {
            tracing::info!(track = %track_id, "Reset track");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Snapshots of every track, sorted by id.
    pub fn snapshots(&self) -> Vec<TrackSnapshot> {
        let mut snapshots: Vec<TrackSnapshot> = self
            .tracks
            .iter()
            .map(|entry| {
                let state = entry.value();
                TrackSnapshot {
                    id: entry.key().clone(),
                    start_time: state.start_time,
                    stop_time: state.stop_time,
                    pending_timeouts: state.pending_timeouts,
                    pending_errors: state.pending_errors,
                    segment_count: state.playlist.segments.len(),
                }
            })
            .collect();

        snapshots.sort_by(|a, b| a.id.cmp(&b.id));
        snapshots
    }
}
