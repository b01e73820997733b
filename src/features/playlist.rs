//! Playlist model and CRUD
//!
//! The current index always points at a valid track or is `None`. Every
//! mutation that removes or moves tracks keeps it on the same logical track.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::settings::PlayMode;
use crate::error::PlaylistError;

/// One playable song entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    pub artist: String,
    /// Stream URL, empty until resolved
    #[serde(default)]
    pub url: String,
    /// Raw LRC text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    /// Song id on the external music service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// When the stream url was last resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_refreshed_at: Option<DateTime<Utc>>,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Track backed by the external service
    pub fn from_source(id: u64, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            source_id: Some(id),
            ..Self::new(title, artist, String::new())
        }
    }

    pub fn is_external(&self) -> bool {
        self.source_id.is_some()
    }

    pub fn has_lyrics(&self) -> bool {
        self.lyrics.as_deref().is_some_and(|l| !l.trim().is_empty())
    }

    /// "Title - Artist", or just the title when the artist is unknown
    pub fn display_name(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.artist)
        }
    }
}

/// Ordered tracks, the selected position and the play mode
#[derive(Debug, Clone, Default)]
pub struct PlaylistState {
    tracks: Vec<Track>,
    current: Option<usize>,
    pub play_mode: PlayMode,
}

impl PlaylistState {
    pub fn new(tracks: Vec<Track>, current: Option<usize>, play_mode: PlayMode) -> Self {
        let current = current.filter(|&i| i < tracks.len());
        Self {
            tracks,
            current,
            play_mode,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Track, PlaylistError> {
        let len = self.tracks.len();
        self.tracks
            .get_mut(index)
            .ok_or(PlaylistError::OutOfRange { index, len })
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    pub fn set_current(&mut self, index: Option<usize>) -> Result<(), PlaylistError> {
        if let Some(i) = index {
            self.check(i)?;
        }
        self.current = index;
        Ok(())
    }

    /// Whether a track with this external id is already present
    pub fn contains_source(&self, id: u64) -> bool {
        self.tracks.iter().any(|t| t.source_id == Some(id))
    }

    pub fn extend(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.tracks.extend(tracks);
    }

    /// Remove a track.
    ///
    /// Removing the current track clears the selection; removing one before
    /// it shifts the selection down by one.
    pub fn remove(&mut self, index: usize) -> Result<Track, PlaylistError> {
        self.check(index)?;
        let track = self.tracks.remove(index);
        self.current = match self.current {
            Some(c) if c == index => None,
            Some(c) if index < c => Some(c - 1),
            other => other,
        };
        Ok(track)
    }

    /// Move a track from one position to another, keeping the selection
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<(), PlaylistError> {
        self.check(from)?;
        self.check(to)?;
        if from == to {
            return Ok(());
        }
        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);

        self.current = self.current.map(|c| {
            if c == from {
                to
            } else if from < c && c <= to {
                c - 1
            } else if to <= c && c < from {
                c + 1
            } else {
                c
            }
        });
        Ok(())
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = None;
    }

    fn check(&self, index: usize) -> Result<(), PlaylistError> {
        if index < self.tracks.len() {
            Ok(())
        } else {
            Err(PlaylistError::OutOfRange {
                index,
                len: self.tracks.len(),
            })
        }
    }
}
