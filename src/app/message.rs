//! Application messages

use crate::error::ResolutionError;
use crate::features::DialogRequest;
use crate::features::player::StreamOutcome;
use crate::features::playlist::Track;
use crate::features::resolver::{ImportProgress, ImportSummary, RefreshSummary};

/// Everything the event loop reacts to
#[derive(Debug)]
pub enum Message {
    // ============ Input ============
    /// A line typed by the user
    Input(String),
    /// stdin reached end of file
    InputClosed,
    /// Periodic position poll
    Tick,

    // ============ Resolution ============
    /// Background stream preparation for the current track finished
    StreamReady(StreamOutcome),
    TrackResolved(Result<Track, ResolutionError>),
    ImportProgress(ImportProgress),
    ImportFinished(Result<ImportSummary, ResolutionError>),
    RefreshFinished(RefreshSummary),

    // ============ Dialogs ============
    /// A dialog waits for the next input line
    Dialog(DialogRequest),
    ClearConfirmed(bool),
    RenameAnswered {
        target: RenameTarget,
        title: Option<String>,
    },
}

/// Track a rename prompt was opened for, as it looked then
#[derive(Debug, Clone, PartialEq)]
pub struct RenameTarget {
    pub index: usize,
    pub source_id: Option<u64>,
    pub title: String,
    pub url: String,
}

/// Whether the loop keeps running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}
