//! Source playlist parsing.
//!
//! The parser is deliberately permissive: unknown tags and malformed
//! `#EXTINF` lines are kept as ordinary lines rather than rejected, since
//! real-world manifests vary a lot. Only a missing `#EXTM3U` marker or a
//! playlist without any segment is fatal.

use regex::Regex;
use std::sync::LazyLock;

use super::{END_MARKER, START_MARKER};
use crate::error::{Error, Result};

static EXTINF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#EXTINF:(?P<duration>[+-]?(?:[0-9]*\.)?[0-9]+),?(?P<title>.*)$").unwrap()
});

/// One playable unit of the source playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentEntry {
    /// Duration in seconds, from the `#EXTINF` tag.
    pub duration: f64,
    /// The `#EXTINF` line followed by every line up to the next entry.
    pub raw_lines: Vec<String>,
}

impl SegmentEntry {
    fn new(duration: f64, extinf_line: &str) -> Self {
        Self {
            duration,
            raw_lines: vec![extinf_line.to_string()],
        }
    }

    /// The first non-tag line of the entry, if any.
    pub fn uri(&self) -> Option<&str> {
        self.raw_lines
            .iter()
            .skip(1)
            .map(String::as_str)
            .find(|line| !line.starts_with('#'))
    }
}

/// A parsed static playlist, replayed cyclically by [`LiveWindow`](super::LiveWindow).
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePlaylist {
    /// Every line before the first valid `#EXTINF`, `#EXTM3U` included.
    pub header: Vec<String>,
    /// Segment entries in source order. Never empty.
    pub segments: Vec<SegmentEntry>,
}

impl SourcePlaylist {
    /// Sum of all segment durations, i.e. the length of one loop.
    pub fn cycle_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Render the whole source as a finished playlist.
    pub fn render_static(&self) -> String {
        let mut lines: Vec<&str> = self.header.iter().map(String::as_str).collect();
        for segment in &self.segments {
            lines.extend(segment.raw_lines.iter().map(String::as_str));
        }
        lines.push(END_MARKER);

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Parse the text of a source manifest.
pub fn parse(text: &str) -> Result<SourcePlaylist> {
    let mut lines = text
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .peekable();

    if lines.peek() != Some(&START_MARKER) {
        return Err(Error::MissingStartMarker);
    }

    let mut header = Vec::new();
    let mut segments: Vec<SegmentEntry> = Vec::new();

    for line in lines {
        if let Some(duration) = extinf_duration(line) {
            segments.push(SegmentEntry::new(duration, line));
            continue;
        }

        if line == END_MARKER {
            continue;
        }

        match segments.last_mut() {
            Some(segment) => segment.raw_lines.push(line.to_string()),
            None => header.push(line.to_string()),
        }
    }

    if segments.is_empty() {
        return Err(Error::NoSegments);
    }

    Ok(SourcePlaylist { header, segments })
}

/// Duration of a valid `#EXTINF` line. Negative or non-finite values do not count.
fn extinf_duration(line: &str) -> Option<f64> {
    let captures = EXTINF_REGEX.captures(line)?;
    let duration: f64 = captures.name("duration")?.as_str().parse().ok()?;

    (duration.is_finite() && duration >= 0.0).then_some(duration)
}
