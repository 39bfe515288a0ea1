//! HLS playlist handling.
//!
//! Parses static source manifests and renders live windows over them.

mod live;
mod parser;

pub use live::LiveWindow;
pub use parser::{parse, SegmentEntry, SourcePlaylist};

/// Playlist start marker.
pub const START_MARKER: &str = "#EXTM3U";

/// End-of-list marker, synthesized on output and never stored.
pub const END_MARKER: &str = "#EXT-X-ENDLIST";
