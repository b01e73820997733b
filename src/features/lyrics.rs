//! Lyrics module - LRC parsing and playback sync
//!
//! - `parser`: LRC text to sorted timed lines
//! - `cursor`: which line is active at a playback position
//! - `file`: reading lyric files in legacy encodings

pub mod cursor;
pub mod file;
pub mod parser;

pub use cursor::{LyricCursor, cursor};
pub use parser::{LyricLine, format_timestamp, parse_lrc, shift, to_lrc};
