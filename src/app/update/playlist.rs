// src/app/update/playlist.rs
//! Playlist and lyrics handlers

use super::{invalid_position, or_status};
use crate::app::command::{Command, LyricsAction, to_index};
use crate::app::message::{Message, RenameTarget};
use crate::app::state::App;
use crate::error::ResolutionError;
use crate::features::link::{self, TrackRef};
use crate::features::lyrics::file::read_lyrics_file;
use crate::features::{PlayerEvent, StatusMessage, Track};

impl App {
    /// Handle playlist editing commands
    pub(super) fn handle_playlist(&mut self, command: &Command) -> Option<Vec<PlayerEvent>> {
        let events = match command {
            Command::Add { reference } => self.add_reference(reference),
            Command::Delete { position } => match to_index(*position) {
                Some(index) => or_status(self.player.delete(index)),
                None => invalid_position(*position),
            },
            Command::Move { from, to } => match (to_index(*from), to_index(*to)) {
                (Some(from), Some(to)) => or_status(self.player.move_track(from, to)),
                (None, _) => invalid_position(*from),
                (_, None) => invalid_position(*to),
            },
            Command::Clear => self.ask_clear(),
            Command::Rename { position } => self.ask_rename(*position),
            Command::List => {
                if let Err(e) = self.renderer.draw_playlist(&self.player) {
                    tracing::warn!("Render failed: {}", e);
                }
                Vec::new()
            }
            Command::Lyrics { action } => self.handle_lyrics(action),
            _ => return None,
        };
        Some(events)
    }

    fn add_reference(&mut self, reference: &str) -> Vec<PlayerEvent> {
        match link::parse_track_ref(reference) {
            Err(e) => vec![PlayerEvent::Status(StatusMessage::error(e.to_string()))],
            Ok(TrackRef::Direct(url)) => {
                let track = Track::new(link::title_from_url(&url), "", url);
                self.player.add_tracks(vec![track])
            }
            Ok(TrackRef::Source(id)) => {
                if self.player.playlist().contains_source(id) {
                    return vec![PlayerEvent::Status(StatusMessage::info("Already in playlist"))];
                }
                let Some(resolver) = self.player.resolver().cloned() else {
                    return vec![PlayerEvent::Status(StatusMessage::error(
                        "No music service configured",
                    ))];
                };
                let tx = self.sender();
                tokio::spawn(async move {
                    let result = resolver.resolve_id(id).await;
                    let _ = tx.send(Message::TrackResolved(result));
                });
                vec![PlayerEvent::Status(StatusMessage::info(format!(
                    "Resolving song {}",
                    id
                )))]
            }
        }
    }

    pub(super) fn on_track_resolved(&mut self, result: Result<Track, ResolutionError>) {
        let events = match result {
            Ok(track) => match track.source_id {
                Some(id) if self.player.playlist().contains_source(id) => {
                    vec![PlayerEvent::Status(StatusMessage::info("Already in playlist"))]
                }
                _ => self.player.add_tracks(vec![track]),
            },
            Err(e) => {
                tracing::warn!("Could not add song: {}", e);
                vec![PlayerEvent::Status(StatusMessage::error(format!(
                    "Could not add song: {}",
                    e
                )))]
            }
        };
        self.emit(events);
    }

    fn ask_clear(&mut self) -> Vec<PlayerEvent> {
        let count = self.player.playlist().len();
        if count == 0 {
            return vec![PlayerEvent::Status(StatusMessage::info("Playlist is already empty"))];
        }
        let dialogs = self.dialogs.clone();
        let tx = self.sender();
        tokio::spawn(async move {
            let confirmed = dialogs
                .confirm(format!("Remove all {} tracks?", count))
                .await;
            let _ = tx.send(Message::ClearConfirmed(confirmed));
        });
        Vec::new()
    }

    pub(super) fn on_clear_confirmed(&mut self, confirmed: bool) {
        if !confirmed {
            return;
        }
        tracing::info!("Clearing playlist");
        let mut events = self.player.clear();
        events.push(PlayerEvent::Status(StatusMessage::info("Playlist cleared")));
        self.emit(events);
    }

    fn ask_rename(&mut self, position: usize) -> Vec<PlayerEvent> {
        let Some(target) = to_index(position).and_then(|index| {
            self.player.playlist().get(index).map(|t| RenameTarget {
                index,
                source_id: t.source_id,
                title: t.title.clone(),
                url: t.url.clone(),
            })
        }) else {
            return invalid_position(position);
        };
        let dialogs = self.dialogs.clone();
        let tx = self.sender();
        tokio::spawn(async move {
            let title = dialogs.prompt("New title", target.title.clone()).await;
            let _ = tx.send(Message::RenameAnswered { target, title });
        });
        Vec::new()
    }

    /// Apply a rename to the prompted track, wherever it is now
    pub(super) fn on_rename_answered(&mut self, target: RenameTarget, title: Option<String>) {
        let Some(title) = title.filter(|t| !t.trim().is_empty()) else {
            return;
        };
        let events = match locate(self.player.playlist().tracks(), &target) {
            Some(index) => or_status(self.player.rename(index, title)),
            None => {
                tracing::warn!("Rename target {} is gone", target.title);
                vec![PlayerEvent::Status(StatusMessage::warning(format!(
                    "{} is no longer in the playlist",
                    target.title
                )))]
            }
        };
        self.emit(events);
    }

    fn handle_lyrics(&mut self, action: &LyricsAction) -> Vec<PlayerEvent> {
        match action {
            LyricsAction::Load { position, path } => {
                let Some(index) = to_index(*position) else {
                    return invalid_position(*position);
                };
                match read_lyrics_file(path) {
                    Ok((_, lines)) if lines.is_empty() => {
                        vec![PlayerEvent::Status(StatusMessage::warning(
                            "No timed lines in lyric file",
                        ))]
                    }
                    Ok((text, lines)) => {
                        let mut events = or_status(self.player.set_lyrics(index, Some(text)));
                        events.push(PlayerEvent::Status(StatusMessage::success(format!(
                            "Loaded {} lyric lines",
                            lines.len()
                        ))));
                        events
                    }
                    Err(e) => vec![PlayerEvent::Status(StatusMessage::error(format!(
                        "Cannot read {}: {}",
                        path.display(),
                        e
                    )))],
                }
            }
            LyricsAction::Clear { position } => match to_index(*position) {
                Some(index) => or_status(self.player.set_lyrics(index, None)),
                None => invalid_position(*position),
            },
            LyricsAction::Shift { seconds } => self.player.shift_lyrics(*seconds),
            LyricsAction::Show => {
                if let Err(e) = self.renderer.draw_lyrics(&self.player) {
                    tracing::warn!("Render failed: {}", e);
                }
                Vec::new()
            }
        }
    }
}

/// Position of the prompted track; the old index wins when it still matches
fn locate(tracks: &[Track], target: &RenameTarget) -> Option<usize> {
    let same = |t: &Track| match target.source_id {
        Some(id) => t.source_id == Some(id),
        None => t.source_id.is_none() && t.url == target.url && t.title == target.title,
    };
    if tracks.get(target.index).is_some_and(same) {
        return Some(target.index);
    }
    tracks.iter().position(same)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_status_converts_errors() {
        let events = or_status(Err(crate::error::PlaylistError::OutOfRange { index: 3, len: 2 }));
        assert!(matches!(
            &events[..],
            [PlayerEvent::Status(StatusMessage { text, .. })] if text.contains("position 4")
        ));
    }

    fn target(index: usize, track: &Track) -> RenameTarget {
        RenameTarget {
            index,
            source_id: track.source_id,
            title: track.title.clone(),
            url: track.url.clone(),
        }
    }

    #[test]
    fn test_locate_follows_moved_track() {
        let mut tracks = vec![
            Track::new("a", "x", "http://m/a.mp3"),
            Track::new("b", "x", "http://m/b.mp3"),
            Track::from_source(7, "c", "x"),
        ];
        let b = target(1, &tracks[1]);
        let c = target(2, &tracks[2]);
        assert_eq!(locate(&tracks, &b), Some(1));

        tracks.swap(0, 2);
        assert_eq!(locate(&tracks, &b), Some(1));
        assert_eq!(locate(&tracks, &c), Some(0));

        tracks.remove(1);
        assert_eq!(locate(&tracks, &b), None);
    }
}
