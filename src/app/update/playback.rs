// src/app/update/playback.rs
//! Playback control handlers
//!
//! Controller calls only queue stream work; `App::emit` spawns it and the
//! outcome comes back as `Message::StreamReady`.

use super::invalid_position;
use crate::app::command::{Command, to_index};
use crate::app::message::Message;
use crate::app::state::App;
use crate::features::settings::MusicQuality;
use crate::features::{PlayerEvent, StatusMessage};
use crate::features::player::{StreamJob, StreamOutcome};

impl App {
    /// Handle playback-related commands
    pub(super) fn handle_playback(&mut self, command: &Command) -> Option<Vec<PlayerEvent>> {
        let events = match command {
            Command::Play { position } => match to_index(*position) {
                Some(index) => self.player.play(index),
                None => invalid_position(*position),
            },
            Command::Pause => self.player.pause(),
            Command::Resume => self.player.resume(),
            Command::Toggle => self.player.toggle(),
            Command::Next => self.player.next(),
            Command::Prev => self.player.prev(),
            Command::Mode { mode } => match mode {
                Some(mode) => self.player.set_mode(*mode),
                None => self.player.cycle_mode(),
            },
            Command::Speed { value } => self.player.set_speed(*value),
            Command::Seek { seconds } => self.player.seek(*seconds),
            Command::Quality { level } => self.set_quality(*level),
            _ => return None,
        };
        Some(events)
    }

    /// Position poll: end-of-track advance, lyric sync and toast expiry
    pub(super) fn handle_tick(&mut self) {
        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
            self.draw_now_playing();
        }
        let events = self.player.tick();
        self.emit(events);
    }

    /// Remember the quality in every settings copy and use it for lookups
    fn set_quality(&mut self, quality: MusicQuality) -> Vec<PlayerEvent> {
        self.settings.quality = quality;
        self.player.set_quality(quality);
        self.persist();
        if let Some(path) = &self.settings_file {
            if let Err(e) = self.settings.save_to_file(path) {
                tracing::error!("Failed to write settings to {:?}: {}", path, e);
            }
        }
        tracing::info!("Quality: {}", quality.level());
        vec![PlayerEvent::Status(StatusMessage::success(format!(
            "Quality set to {}",
            quality.display_name()
        )))]
    }

    /// Resolve and probe the current stream without blocking the loop
    pub(in crate::app) fn spawn_stream_job(&self, job: StreamJob) {
        let tx = self.sender();
        tokio::spawn(async move {
            let outcome = job.run().await;
            let _ = tx.send(Message::StreamReady(outcome));
        });
    }

    pub(super) fn on_stream_ready(&mut self, outcome: StreamOutcome) {
        let events = self.player.on_stream_ready(outcome);
        self.emit(events);
    }
}
