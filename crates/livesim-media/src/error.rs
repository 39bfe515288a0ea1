//! Error types for livesim-media.

use thiserror::Error;

/// Result type for livesim-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for livesim-media operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The manifest does not open with `#EXTM3U`.
    #[error("Invalid playlist: missing #EXTM3U start marker")]
    MissingStartMarker,

    /// The manifest has no valid `#EXTINF` entry to loop over.
    #[error("Invalid playlist: no #EXTINF segments")]
    NoSegments,
}
