//! Player state machine
//!
//! `PlayerController` owns the playlist, playback flags and lyric cursor.
//! Every mutator returns the `PlayerEvent`s describing what changed so the
//! rendering layer can redraw only the affected regions.
//!
//! Starting a track never waits on the network: the controller hands out a
//! `StreamJob` that resolves and probes the stream elsewhere, and finishes
//! the load when the matching `StreamOutcome` comes back.

pub mod navigator;

use std::sync::Arc;

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub use navigator::QueueNavigator;

use super::lyrics::{self, LyricCursor};
use super::playlist::{PlaylistState, Track};
use super::resolver::{ImportSummary, RefreshSummary, Resolver};
use super::settings::{MusicQuality, PlayMode};
use crate::audio::{MediaBackend, PlaybackStatus, StreamProbe};
use crate::error::{PlaylistError, ResolutionError};

pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Success,
    Error,
    Warning,
    Info,
}

/// Transient user-visible message
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, level: StatusLevel) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, StatusLevel::Success)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, StatusLevel::Error)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, StatusLevel::Warning)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, StatusLevel::Info)
    }
}

/// Description of a state change
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Tracks were added, removed, reordered or edited
    PlaylistChanged,
    CurrentTrackChanged(Option<usize>),
    PlaybackChanged { is_playing: bool },
    PlayModeChanged(PlayMode),
    SpeedChanged(f32),
    /// The lyric line set of the current track was replaced
    LyricsChanged,
    LyricIndexChanged(Option<usize>),
    Status(StatusMessage),
}

/// Stream preparation for the current track, run off the event loop.
///
/// Resolves a missing URL, probes it, and on a failed probe of a track with
/// an external id fetches one fresh URL and probes again.
pub struct StreamJob {
    generation: u64,
    name: String,
    url: String,
    source_id: Option<u64>,
    resolver: Option<Resolver>,
    probe: Arc<dyn StreamProbe>,
}

/// Result of a `StreamJob`, fed back through `PlayerController::on_stream_ready`
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOutcome {
    generation: u64,
    /// The URL was replaced while preparing
    refreshed: bool,
    /// Playable URL, or the user-facing failure
    result: Result<String, String>,
}

impl StreamJob {
    pub async fn run(self) -> StreamOutcome {
        let mut url = self.url.clone();
        let mut refreshed = false;

        if url.is_empty() {
            if let Some(id) = self.source_id {
                refreshed = true;
                match self.refresh(id).await {
                    Ok(fresh) => url = fresh,
                    Err(e) => {
                        return self.outcome(false, Err(format!("Cannot resolve {}: {}", self.name, e)));
                    }
                }
            }
        }

        loop {
            let error = match self.probe.check(&url).await {
                Ok(()) => return self.outcome(refreshed, Ok(url)),
                Err(e) => e,
            };
            let Some(id) = self.source_id.filter(|_| !refreshed) else {
                return self.outcome(refreshed, Err(format!("Cannot play {}: {}", self.name, error)));
            };
            tracing::warn!("Stream for {} failed ({}), re-resolving", self.name, error);
            refreshed = true;
            match self.refresh(id).await {
                Ok(fresh) => url = fresh,
                Err(re) => {
                    return self.outcome(
                        false,
                        Err(format!("Cannot play {}: {} ({})", self.name, error, re)),
                    );
                }
            }
        }
    }

    async fn refresh(&self, id: u64) -> Result<String, ResolutionError> {
        let resolver = self
            .resolver
            .as_ref()
            .ok_or_else(|| ResolutionError::Network("no music service configured".into()))?;
        resolver.refresh_stream(id).await
    }

    fn outcome(&self, refreshed: bool, result: Result<String, String>) -> StreamOutcome {
        StreamOutcome {
            generation: self.generation,
            refreshed,
            result,
        }
    }
}

pub struct PlayerController {
    playlist: PlaylistState,
    is_playing: bool,
    speed: f32,
    lyrics: LyricCursor,
    backend: Box<dyn MediaBackend>,
    resolver: Option<Resolver>,
    rng: StdRng,
    /// Set while a refresh-all batch is in flight
    refreshing: bool,
    /// Bumped on every stream start and stop; stale outcomes are dropped
    generation: u64,
    /// Generation whose stream is being prepared
    loading: Option<u64>,
    /// Prepared job not yet handed to the caller
    job: Option<StreamJob>,
}

impl std::fmt::Debug for PlayerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerController")
            .field("playlist", &self.playlist)
            .field("is_playing", &self.is_playing)
            .field("speed", &self.speed)
            .field("refreshing", &self.refreshing)
            .field("loading", &self.loading)
            .finish()
    }
}

impl PlayerController {
    pub fn new(
        playlist: PlaylistState,
        backend: Box<dyn MediaBackend>,
        resolver: Option<Resolver>,
    ) -> Self {
        let mut controller = Self {
            playlist,
            is_playing: false,
            speed: 1.0,
            lyrics: LyricCursor::default(),
            backend,
            resolver,
            rng: StdRng::from_os_rng(),
            refreshing: false,
            generation: 0,
            loading: None,
            job: None,
        };
        controller.reload_lyrics();
        controller
    }

    /// Deterministic shuffle order
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn playlist(&self) -> &PlaylistState {
        &self.playlist
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn lyrics(&self) -> &LyricCursor {
        &self.lyrics
    }

    pub fn resolver(&self) -> Option<&Resolver> {
        self.resolver.as_ref()
    }

    pub fn position(&self) -> f64 {
        self.backend.position()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// The current track's stream is being prepared
    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Stream preparation queued by the last mutator, to run in the background
    pub fn take_stream_job(&mut self) -> Option<StreamJob> {
        self.job.take()
    }

    pub fn status(&self) -> PlaybackStatus {
        match (self.playlist.current_index(), self.is_playing) {
            (None, _) => PlaybackStatus::Stopped,
            (Some(_), true) => PlaybackStatus::Playing,
            (Some(_), false) => PlaybackStatus::Paused,
        }
    }

    /// Re-apply a persisted speed and lyric index
    pub fn restore(&mut self, speed: f32, lyric_index: Option<usize>) {
        self.speed = clamp_speed(speed).unwrap_or(1.0);
        self.lyrics.restore(lyric_index);
    }

    fn reload_lyrics(&mut self) {
        let lines = self
            .playlist
            .current()
            .and_then(|t| t.lyrics.as_deref())
            .map(lyrics::parse_lrc)
            .unwrap_or_default();
        self.lyrics.set_lines(lines);
    }

    fn set_playing(&mut self, playing: bool, events: &mut Vec<PlayerEvent>) {
        if self.is_playing != playing {
            self.is_playing = playing;
            events.push(PlayerEvent::PlaybackChanged {
                is_playing: playing,
            });
        }
    }

    fn fail(&mut self, text: String, events: &mut Vec<PlayerEvent>) {
        tracing::warn!("{}", text);
        self.set_playing(false, events);
        events.push(PlayerEvent::Status(StatusMessage::error(text)));
    }

    // ============ Playback ============

    /// Make `index` current and queue its stream
    pub fn play(&mut self, index: usize) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        if self.playlist.set_current(Some(index)).is_err() {
            events.push(PlayerEvent::Status(StatusMessage::error(format!(
                "No track at position {}",
                index + 1
            ))));
            return events;
        }

        self.reload_lyrics();
        events.push(PlayerEvent::CurrentTrackChanged(Some(index)));
        events.push(PlayerEvent::LyricsChanged);
        self.start_current(&mut events);
        events
    }

    /// Stop the element and queue stream preparation for the current track
    fn start_current(&mut self, events: &mut Vec<PlayerEvent>) {
        let Some(track) = self.playlist.current() else {
            return;
        };
        let job = StreamJob {
            generation: self.generation + 1,
            name: track.display_name(),
            url: track.url.clone(),
            source_id: track.source_id,
            resolver: self.resolver.clone(),
            probe: self.backend.probe(),
        };
        self.cancel_load();
        self.backend.stop();
        self.set_playing(false, events);
        tracing::debug!("Preparing stream for {}", job.name);
        self.generation = job.generation;
        self.loading = Some(job.generation);
        self.job = Some(job);
    }

    /// Forget any stream still being prepared
    fn cancel_load(&mut self) {
        self.generation += 1;
        self.loading = None;
        self.job = None;
    }

    /// Finish a load once its stream is ready.
    ///
    /// Outcomes for a track that is no longer being started are ignored.
    /// Failures never advance the playlist.
    pub fn on_stream_ready(&mut self, outcome: StreamOutcome) -> Vec<PlayerEvent> {
        if self.loading != Some(outcome.generation) {
            tracing::debug!("Dropping stale stream for generation {}", outcome.generation);
            return Vec::new();
        }
        self.loading = None;
        let Some(index) = self.playlist.current_index() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        let url = match outcome.result {
            Ok(url) => url,
            Err(text) => {
                self.fail(text, &mut events);
                return events;
            }
        };
        if outcome.refreshed {
            if let Ok(track) = self.playlist.get_mut(index) {
                track.url = url.clone();
                track.url_refreshed_at = Some(Utc::now());
                events.push(PlayerEvent::PlaylistChanged);
            }
        }

        let Some(track) = self.playlist.get(index) else {
            return events;
        };
        let duration = track.duration_ms.map(|ms| ms as f64 / 1000.0);
        let name = track.display_name();
        let started = self.backend.load(&url, duration).and_then(|()| {
            self.backend.set_speed(self.speed);
            self.backend.play()
        });
        match started {
            Ok(()) => {
                tracing::info!("Playing {}", name);
                self.set_playing(true, &mut events);
            }
            Err(e) => self.fail(format!("Cannot play {}: {}", name, e), &mut events),
        }
        events
    }

    /// End-of-track transition according to the play mode
    pub fn advance(&mut self) -> Vec<PlayerEvent> {
        let nav = QueueNavigator::new(
            self.playlist.len(),
            self.playlist.current_index(),
            self.playlist.play_mode,
        );
        match nav.next_index(&mut self.rng) {
            Some(next) => self.play(next),
            None => {
                tracing::info!("Reached end of playlist");
                self.stop()
            }
        }
    }

    /// User skip; same policy as the end of a track
    pub fn next(&mut self) -> Vec<PlayerEvent> {
        self.advance()
    }

    pub fn prev(&mut self) -> Vec<PlayerEvent> {
        let nav = QueueNavigator::new(
            self.playlist.len(),
            self.playlist.current_index(),
            self.playlist.play_mode,
        );
        match nav.prev_index() {
            Some(prev) => self.play(prev),
            None => Vec::new(),
        }
    }

    /// Pause playback; a stream still being prepared is abandoned
    pub fn pause(&mut self) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        if self.loading.is_some() {
            self.cancel_load();
            events.push(PlayerEvent::Status(StatusMessage::info("Loading cancelled")));
        } else if self.is_playing {
            self.backend.pause();
            self.set_playing(false, &mut events);
        }
        events
    }

    pub fn resume(&mut self) -> Vec<PlayerEvent> {
        if self.is_playing || self.loading.is_some() {
            return Vec::new();
        }
        if self.playlist.current_index().is_none() {
            if self.playlist.is_empty() {
                return vec![PlayerEvent::Status(StatusMessage::info("Playlist is empty"))];
            }
            return self.play(0);
        }

        let mut events = Vec::new();
        if self.backend.status() == PlaybackStatus::Stopped {
            // Nothing loaded yet, e.g. after restoring a saved session
            self.start_current(&mut events);
            return events;
        }
        match self.backend.play() {
            Ok(()) => self.set_playing(true, &mut events),
            Err(e) => self.fail(format!("Cannot resume: {}", e), &mut events),
        }
        events
    }

    pub fn toggle(&mut self) -> Vec<PlayerEvent> {
        if self.is_playing || self.loading.is_some() {
            self.pause()
        } else {
            self.resume()
        }
    }

    /// Stop playback and clear the selection
    pub fn stop(&mut self) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        self.cancel_load();
        self.backend.stop();
        self.set_playing(false, &mut events);
        if self.playlist.current_index().is_some() {
            // None is always accepted
            let _ = self.playlist.set_current(None);
            events.push(PlayerEvent::CurrentTrackChanged(None));
        }
        if !self.lyrics.lines().is_empty() {
            self.lyrics.set_lines(Vec::new());
            events.push(PlayerEvent::LyricsChanged);
        }
        events
    }

    pub fn seek(&mut self, position: f64) -> Vec<PlayerEvent> {
        self.backend.seek(position);
        self.on_position(self.backend.position())
    }

    /// Lyric sync for a new playback position
    pub fn on_position(&mut self, position: f64) -> Vec<PlayerEvent> {
        match self.lyrics.update(position) {
            Some(index) => vec![PlayerEvent::LyricIndexChanged(index)],
            None => Vec::new(),
        }
    }

    /// Poll the media element: advance at end of track, otherwise sync lyrics
    pub fn tick(&mut self) -> Vec<PlayerEvent> {
        if !self.is_playing {
            return Vec::new();
        }
        if self.backend.is_ended() {
            return self.advance();
        }
        self.on_position(self.backend.position())
    }

    // ============ Modes ============

    pub fn set_mode(&mut self, mode: PlayMode) -> Vec<PlayerEvent> {
        if self.playlist.play_mode == mode {
            return Vec::new();
        }
        self.playlist.play_mode = mode;
        tracing::info!("Play mode: {}", mode);
        vec![PlayerEvent::PlayModeChanged(mode)]
    }

    pub fn cycle_mode(&mut self) -> Vec<PlayerEvent> {
        self.set_mode(self.playlist.play_mode.next())
    }

    /// Stream quality for later resolutions; the playing stream is kept
    pub fn set_quality(&mut self, quality: MusicQuality) {
        if let Some(resolver) = self.resolver.as_mut() {
            resolver.set_quality(quality);
        }
    }

    pub fn set_speed(&mut self, speed: f32) -> Vec<PlayerEvent> {
        let Some(speed) = clamp_speed(speed) else {
            return vec![PlayerEvent::Status(StatusMessage::warning("Invalid speed"))];
        };
        if speed == self.speed {
            return Vec::new();
        }
        self.speed = speed;
        self.backend.set_speed(speed);
        vec![PlayerEvent::SpeedChanged(speed)]
    }

    // ============ Playlist ============

    pub fn add_tracks(&mut self, tracks: Vec<Track>) -> Vec<PlayerEvent> {
        if tracks.is_empty() {
            return Vec::new();
        }
        let message = match tracks.as_slice() {
            [one] => format!("Added {}", one.display_name()),
            many => format!("Added {} tracks", many.len()),
        };
        self.playlist.extend(tracks);
        vec![
            PlayerEvent::PlaylistChanged,
            PlayerEvent::Status(StatusMessage::success(message)),
        ]
    }

    /// Remove a track; removing the current one stops playback
    pub fn delete(&mut self, index: usize) -> Result<Vec<PlayerEvent>, PlaylistError> {
        let before = self.playlist.current_index();
        let was_current = before == Some(index);
        let removed = self.playlist.remove(index)?;
        let mut events = vec![PlayerEvent::PlaylistChanged];

        if was_current {
            self.cancel_load();
            self.backend.stop();
            self.set_playing(false, &mut events);
            self.lyrics.set_lines(Vec::new());
            events.push(PlayerEvent::CurrentTrackChanged(None));
            events.push(PlayerEvent::LyricsChanged);
        } else if self.playlist.current_index() != before {
            events.push(PlayerEvent::CurrentTrackChanged(self.playlist.current_index()));
        }

        events.push(PlayerEvent::Status(StatusMessage::info(format!(
            "Removed {}",
            removed.display_name()
        ))));
        Ok(events)
    }

    pub fn move_track(&mut self, from: usize, to: usize) -> Result<Vec<PlayerEvent>, PlaylistError> {
        let before = self.playlist.current_index();
        self.playlist.move_track(from, to)?;
        let mut events = vec![PlayerEvent::PlaylistChanged];
        if self.playlist.current_index() != before {
            events.push(PlayerEvent::CurrentTrackChanged(self.playlist.current_index()));
        }
        Ok(events)
    }

    pub fn rename(&mut self, index: usize, title: String) -> Result<Vec<PlayerEvent>, PlaylistError> {
        self.playlist.get_mut(index)?.title = title;
        Ok(vec![PlayerEvent::PlaylistChanged])
    }

    pub fn clear(&mut self) -> Vec<PlayerEvent> {
        let mut events = self.stop();
        self.playlist.clear();
        events.push(PlayerEvent::PlaylistChanged);
        events
    }

    /// Replace the raw lyrics of a track, re-parsing if it is current
    pub fn set_lyrics(
        &mut self,
        index: usize,
        text: Option<String>,
    ) -> Result<Vec<PlayerEvent>, PlaylistError> {
        self.playlist.get_mut(index)?.lyrics = text.filter(|t| !t.trim().is_empty());
        let mut events = vec![PlayerEvent::PlaylistChanged];
        if self.playlist.current_index() == Some(index) {
            self.reload_lyrics();
            events.push(PlayerEvent::LyricsChanged);
            events.extend(self.on_position(self.backend.position()));
        }
        Ok(events)
    }

    /// Move every lyric line of the current track by `offset` seconds
    pub fn shift_lyrics(&mut self, offset: f64) -> Vec<PlayerEvent> {
        let Some(index) = self.playlist.current_index() else {
            return vec![PlayerEvent::Status(StatusMessage::warning("Nothing is playing"))];
        };
        if self.lyrics.lines().is_empty() {
            return vec![PlayerEvent::Status(StatusMessage::warning("Track has no lyrics"))];
        }
        let text = lyrics::to_lrc(&lyrics::shift(self.lyrics.lines(), offset));
        self.set_lyrics(index, Some(text)).unwrap_or_default()
    }

    // ============ Resolution results ============

    pub fn apply_import(&mut self, summary: ImportSummary) -> Vec<PlayerEvent> {
        let text = format!(
            "Imported {}: {} added, {} failed, {} duplicates skipped",
            summary.name, summary.success_count, summary.fail_count, summary.skipped_duplicates
        );
        let level = if summary.fail_count > 0 {
            StatusLevel::Warning
        } else {
            StatusLevel::Success
        };
        let mut events = Vec::new();
        if !summary.tracks.is_empty() {
            self.playlist.extend(summary.tracks);
            events.push(PlayerEvent::PlaylistChanged);
        }
        events.push(PlayerEvent::Status(StatusMessage::new(text, level)));
        events
    }

    /// Claim the refresh-all guard.
    ///
    /// Returns the resolver and ids to refresh, or the events explaining why
    /// nothing starts.
    pub fn begin_refresh_all(&mut self) -> Result<(Resolver, Vec<u64>), Vec<PlayerEvent>> {
        if self.refreshing {
            return Err(vec![PlayerEvent::Status(StatusMessage::warning(
                "A refresh is already running",
            ))]);
        }
        let Some(resolver) = self.resolver.clone() else {
            return Err(vec![PlayerEvent::Status(StatusMessage::error(
                "No music service configured",
            ))]);
        };
        let ids: Vec<u64> = self
            .playlist
            .tracks()
            .iter()
            .filter_map(|t| t.source_id)
            .collect();
        if ids.is_empty() {
            return Err(vec![PlayerEvent::Status(StatusMessage::info(
                "No tracks to refresh",
            ))]);
        }
        self.refreshing = true;
        Ok((resolver, ids))
    }

    /// Apply refreshed URLs by external id and release the guard
    pub fn finish_refresh_all(&mut self, summary: RefreshSummary) -> Vec<PlayerEvent> {
        self.refreshing = false;
        let now = Utc::now();
        for (id, url) in &summary.urls {
            for i in 0..self.playlist.len() {
                if let Ok(track) = self.playlist.get_mut(i) {
                    if track.source_id == Some(*id) {
                        track.url = url.clone();
                        track.url_refreshed_at = Some(now);
                    }
                }
            }
        }
        let level = if summary.fail_count > 0 {
            StatusLevel::Warning
        } else {
            StatusLevel::Success
        };
        vec![
            PlayerEvent::PlaylistChanged,
            PlayerEvent::Status(StatusMessage::new(
                format!(
                    "Refreshed {} links, {} failed",
                    summary.success_count, summary.fail_count
                ),
                level,
            )),
        ]
    }
}

/// Clamp to the supported range; `None` for NaN
fn clamp_speed(speed: f32) -> Option<f32> {
    if speed.is_nan() {
        None
    } else {
        Some(speed.clamp(MIN_SPEED, MAX_SPEED))
    }
}
