//! Fault injection.
//!
//! Control requests queue faults on a track; segment requests consume them.
//! Timeouts and errors are counted separately and each pending fault
//! affects exactly one later request. Stopping is a separate axis and does
//! not touch the counters.

use chrono::{DateTime, Utc};

use super::store::TrackState;

/// A control action against a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultAction {
    /// Freeze the live window and terminate the playlist.
    Stop,
    /// Hold the next unfaulted segment request open until it fails.
    InjectTimeout,
    /// Answer the next unfaulted segment request with a server error.
    InjectError,
}

impl FaultAction {
    /// Pick the action from the control request's flags, first match wins.
    pub fn from_flags(is_set: impl Fn(&str) -> bool) -> Option<Self> {
        if is_set("stop") {
            Some(Self::Stop)
        } else if is_set("timeout") {
            Some(Self::InjectTimeout)
        } else if is_set("mp3error") {
            Some(Self::InjectError)
        } else {
            None
        }
    }
}

/// Apply `action` to a track at `now`.
pub fn apply(state: &mut TrackState, action: FaultAction, now: DateTime<Utc>) {
    match action {
        FaultAction::Stop => {
            if state.stop_time.is_none() {
                state.stop_time = Some(now);
            }
        }
        FaultAction::InjectTimeout => {
            state.pending_timeouts = state.pending_timeouts.saturating_add(1);
        }
        FaultAction::InjectError => {
            state.pending_errors = state.pending_errors.saturating_add(1);
        }
    }
}

/// A fault consumed by a segment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentFault {
    /// Hold the connection open, then fail. Carries the timeouts left.
    HoldOpen { remaining: u32 },
    /// Fail immediately. Carries the errors left.
    ServerError { remaining: u32 },
}

/// Consume the next pending fault for a segment request, timeouts first.
pub fn take_segment_fault(state: &mut TrackState) -> Option<SegmentFault> {
    if state.pending_timeouts > 0 {
        state.pending_timeouts -= 1;
        Some(SegmentFault::HoldOpen {
            remaining: state.pending_timeouts,
        })
    } else if state.pending_errors > 0 {
        state.pending_errors -= 1;
        Some(SegmentFault::ServerError {
            remaining: state.pending_errors,
        })
    } else {
        None
    }
}
