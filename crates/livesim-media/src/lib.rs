//! Livesim-Media: HLS playlist parsing and live window rendering
//!
//! This crate holds the pure playlist logic of the simulator. It never
//! touches the filesystem or the network; callers hand it manifest text and
//! timestamps and get manifest text back.
//!
//! # Modules
//!
//! - `hls::parser` - Source manifest parsing into header + segment entries
//! - `hls::live` - Time-advancing live window over a looped source
//!
//! # Live window
//!
//! A source playlist of finite length is replayed cyclically from the
//! moment a track was first requested. The visible window grows with
//! elapsed wall-clock time and is closed with `#EXT-X-ENDLIST` only once
//! the track has been stopped.

pub mod error;
pub mod hls;

pub use error::{Error, Result};
pub use hls::{LiveWindow, SegmentEntry, SourcePlaylist};
