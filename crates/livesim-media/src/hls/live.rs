//! Live window rendering.
//!
//! Emulates a live encoder over a finite source: segments are replayed in
//! a loop starting at the track's start time, and the visible window holds
//! every segment that has started by "now" (plus a small lookahead). The
//! window is left unterminated while live so clients keep polling.

use chrono::{DateTime, TimeDelta, Utc};

use super::parser::SourcePlaylist;
use super::END_MARKER;

/// A live view over a looped [`SourcePlaylist`].
#[derive(Debug, Clone, Copy)]
pub struct LiveWindow<'a> {
    playlist: &'a SourcePlaylist,
    start: DateTime<Utc>,
    stop: Option<DateTime<Utc>>,
    lookahead: TimeDelta,
}

impl<'a> LiveWindow<'a> {
    /// Create a live window anchored at `start`, without lookahead.
    pub fn new(playlist: &'a SourcePlaylist, start: DateTime<Utc>) -> Self {
        Self {
            playlist,
            start,
            stop: None,
            lookahead: TimeDelta::zero(),
        }
    }

    /// Freeze the window at `stop`, if set.
    pub fn stopped_at(mut self, stop: Option<DateTime<Utc>>) -> Self {
        self.stop = stop;
        self
    }

    /// Extend the live edge by `lookahead`, modelling encoder buffering.
    /// Has no effect once stopped.
    pub fn with_lookahead(mut self, lookahead: TimeDelta) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Whether the window is frozen.
    pub fn is_ended(&self) -> bool {
        self.stop.is_some()
    }

    /// The instant the window is cut at for a request made at `now`.
    /// Saturates at the latest representable instant.
    pub fn effective_now(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.stop.unwrap_or_else(|| {
            now.checked_add_signed(self.lookahead)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        })
    }

    /// Source segment indices visible at `now`, in playback order.
    pub fn segment_indices(&self, now: DateTime<Utc>) -> Vec<usize> {
        let elapsed = (self.effective_now(now) - self.start).num_milliseconds() as f64 / 1000.0;
        let segments = &self.playlist.segments;
        let len = segments.len();

        // A zero-length cycle would never advance the clock; show one pass.
        let bounded = self.playlist.cycle_duration() <= 0.0;

        let mut indices = Vec::new();
        let mut clock = 0.0;
        let mut position = 0usize;

        while clock < elapsed && len > 0 {
            if bounded && position >= len {
                break;
            }
            let index = position % len;
            indices.push(index);
            clock += segments[index].duration;
            position += 1;
        }

        indices
    }

    /// Render the manifest text a client sees at `now`.
    pub fn render(&self, now: DateTime<Utc>) -> String {
        let mut lines: Vec<&str> = self.playlist.header.iter().map(String::as_str).collect();

        for index in self.segment_indices(now) {
            let segment = &self.playlist.segments[index];
            lines.extend(segment.raw_lines.iter().map(String::as_str));
        }

        if self.is_ended() {
            lines.push(END_MARKER);
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::parse;
    use chrono::TimeZone;

    fn playlist(durations: &[f64]) -> SourcePlaylist {
        let mut text = String::from("#EXTM3U\n#EXT-X-TARGETDURATION:5\n");
        for (i, d) in durations.iter().enumerate() {
            text.push_str(&format!("#EXTINF:{d},\nseg{i}.mp3\n"));
        }
        parse(&text).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn secs(s: f64) -> TimeDelta {
        TimeDelta::milliseconds((s * 1000.0) as i64)
    }

    #[test]
    fn test_window_at_four_seconds() {
        let source = playlist(&[2.0, 3.0, 5.0]);
        let window = LiveWindow::new(&source, t0());

        assert_eq!(window.segment_indices(t0() + secs(4.0)), vec![0, 1]);

        let m3u8 = window.render(t0() + secs(4.0));
        assert!(m3u8.contains("seg0.mp3"));
        assert!(m3u8.contains("seg1.mp3"));
        assert!(!m3u8.contains("seg2.mp3"));
        assert!(!m3u8.contains(END_MARKER));
    }

    #[test]
    fn test_window_cycles_through_source() {
        let source = playlist(&[2.0, 3.0, 5.0]);
        let window = LiveWindow::new(&source, t0());

        // 0, 2, 5, 10, 12, 15 -> six segments have started before 16s.
        assert_eq!(window.segment_indices(t0() + secs(16.0)), vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_fresh_track_has_at_most_one_segment() {
        let source = playlist(&[2.0, 3.0, 5.0]);

        let window = LiveWindow::new(&source, t0());
        assert!(window.segment_indices(t0()).is_empty());
        assert_eq!(window.render(t0()), "#EXTM3U\n#EXT-X-TARGETDURATION:5\n");

        let window = window.with_lookahead(secs(1.0));
        assert_eq!(window.segment_indices(t0()), vec![0]);
    }

    #[test]
    fn test_time_before_start_yields_header_only() {
        let source = playlist(&[2.0]);
        let window = LiveWindow::new(&source, t0());

        assert!(window.segment_indices(t0() - secs(30.0)).is_empty());
    }

    #[test]
    fn test_window_grows_monotonically() {
        let source = playlist(&[1.5, 0.5, 4.0, 2.0]);
        let window = LiveWindow::new(&source, t0()).with_lookahead(secs(1.0));

        let mut previous = 0;
        for step in 0..200 {
            let count = window.segment_indices(t0() + secs(step as f64 * 0.37)).len();
            assert!(count >= previous, "window shrank at step {step}");
            previous = count;
        }
        assert!(previous > 0);
    }

    #[test]
    fn test_stopped_window_is_frozen() {
        let source = playlist(&[2.0, 3.0, 5.0]);
        let stop = t0() + secs(7.0);
        let window = LiveWindow::new(&source, t0())
            .with_lookahead(secs(1.0))
            .stopped_at(Some(stop));

        let first = window.render(stop + secs(1.0));
        let later = window.render(stop + secs(3600.0));

        assert_eq!(first, later);
        assert_eq!(first.matches(END_MARKER).count(), 1);
        assert!(first.ends_with("#EXT-X-ENDLIST\n"));
        // Lookahead is ignored once frozen: 0, 2, 5 have started before 7s.
        assert_eq!(window.segment_indices(stop), vec![0, 1, 2]);
    }

    #[test]
    fn test_effective_now_saturates_on_huge_lookahead() {
        let source = playlist(&[2.0]);
        let window = LiveWindow::new(&source, t0()).with_lookahead(TimeDelta::MAX);

        assert_eq!(window.effective_now(t0()), DateTime::<Utc>::MAX_UTC);

        let stop = t0() + secs(3.0);
        assert_eq!(window.stopped_at(Some(stop)).effective_now(t0()), stop);
    }

    #[test]
    fn test_zero_length_cycle_is_bounded() {
        let source = playlist(&[0.0, 0.0]);
        let window = LiveWindow::new(&source, t0());

        assert_eq!(window.segment_indices(t0() + secs(100.0)), vec![0, 1]);
    }

    #[test]
    fn test_zero_length_segment_inside_cycle() {
        let source = playlist(&[0.0, 2.0]);
        let window = LiveWindow::new(&source, t0());

        assert_eq!(window.segment_indices(t0() + secs(3.0)), vec![0, 1, 0, 1]);
    }
}
