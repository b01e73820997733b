// src/app/update/import.rs
//! Playlist import and link refresh handlers

use std::collections::HashSet;

use crate::app::command::Command;
use crate::app::message::Message;
use crate::app::state::App;
use crate::error::ResolutionError;
use crate::features::link;
use crate::features::persistence::ImportRecord;
use crate::features::resolver::{ImportProgress, ImportSummary, RefreshSummary, progress_channel};
use crate::features::{PlayerEvent, StatusMessage};

impl App {
    /// Handle import and refresh commands
    pub(super) fn handle_import(&mut self, command: &Command) -> Option<Vec<PlayerEvent>> {
        let events = match command {
            Command::Import { reference } => self.start_import(reference),
            Command::Refresh => self.start_refresh(),
            _ => return None,
        };
        Some(events)
    }

    fn start_import(&mut self, reference: &str) -> Vec<PlayerEvent> {
        let playlist_id = match link::parse_playlist_ref(reference) {
            Ok(id) => id,
            Err(e) => return vec![PlayerEvent::Status(StatusMessage::error(e.to_string()))],
        };
        let Some(resolver) = self.player.resolver().cloned() else {
            return vec![PlayerEvent::Status(StatusMessage::error(
                "No music service configured",
            ))];
        };
        let existing: HashSet<u64> = self
            .player
            .playlist()
            .tracks()
            .iter()
            .filter_map(|t| t.source_id)
            .collect();

        let tx = self.sender();
        let (progress_tx, mut progress_rx) = progress_channel();
        let forward = tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                if forward.send(Message::ImportProgress(progress)).is_err() {
                    break;
                }
            }
        });
        tokio::spawn(async move {
            let result = resolver
                .import_playlist(playlist_id, existing, Some(progress_tx))
                .await;
            // Deliver every progress update before the summary
            let _ = forwarder.await;
            let _ = tx.send(Message::ImportFinished(result));
        });

        tracing::info!("Started import of playlist {}", playlist_id);
        vec![PlayerEvent::Status(StatusMessage::info(format!(
            "Importing playlist {}",
            playlist_id
        )))]
    }

    pub(super) fn on_import_progress(&mut self, progress: &ImportProgress) {
        if let Err(e) = self.renderer.draw_progress(progress) {
            tracing::warn!("Render failed: {}", e);
        }
    }

    pub(super) fn on_import_finished(&mut self, result: Result<ImportSummary, ResolutionError>) {
        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Playlist import failed: {}", e);
                self.status(StatusMessage::error(format!("Import failed: {}", e)));
                return;
            }
        };

        self.record_import(ImportRecord::from_summary(&summary));
        let was_empty = self.player.playlist().is_empty();
        let imported = !summary.tracks.is_empty();

        let mut events = self.player.apply_import(summary);
        if was_empty && imported && self.settings.playback.auto_play_on_import {
            events.extend(self.player.play(0));
        }
        self.emit(events);
        if !imported {
            // Only the history changed
            self.persist();
        }
    }

    fn start_refresh(&mut self) -> Vec<PlayerEvent> {
        let (resolver, ids) = match self.player.begin_refresh_all() {
            Ok(work) => work,
            Err(events) => return events,
        };
        let count = ids.len();
        let tx = self.sender();
        tokio::spawn(async move {
            let summary = resolver.refresh_all(ids).await;
            let _ = tx.send(Message::RefreshFinished(summary));
        });
        vec![PlayerEvent::Status(StatusMessage::info(format!(
            "Refreshing {} links",
            count
        )))]
    }

    pub(super) fn on_refresh_finished(&mut self, summary: RefreshSummary) {
        let events = self.player.finish_refresh_all(summary);
        self.emit(events);
    }
}
