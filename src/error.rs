//! Error kinds shared across the player

use thiserror::Error;

/// Remote metadata / stream lookup failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The remote service could not be reached
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status code
    #[error("remote returned status code {code}")]
    Status { code: i64 },

    /// Response body did not have the expected shape
    #[error("malformed response: {0}")]
    Decode(String),

    /// Lookup succeeded but no playable stream was offered
    #[error("no playable stream url for song {0}")]
    NoStreamUrl(u64),

    /// Input was neither an id nor a recognised link
    #[error("not a song or playlist reference: {0}")]
    InvalidReference(String),
}

impl From<reqwest::Error> for ResolutionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ResolutionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// The media element failed to start or continue
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("track has no stream url")]
    EmptyUrl,

    #[error("stream unreachable: {0}")]
    Unreachable(String),

    /// Stream host refused the request, typically an expired link
    #[error("stream rejected with HTTP {status}")]
    Rejected { status: u16 },
}

/// A lyric line without a timestamp match. Never surfaced to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unmatched lyric line: {0}")]
pub struct ParseError(pub String);

/// Persistence failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Could not determine data directory")]
    NoDataDir,
}

/// Playlist index out of range
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaylistError {
    #[error("no track at position {} (playlist has {len})", .index + 1)]
    OutOfRange { index: usize, len: usize },
}
