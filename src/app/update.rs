// src/app/update.rs
//! Message update handlers - thin dispatcher delegating to submodules

mod import;
mod playback;
mod playlist;
mod window;

use super::command::{self, Command};
use super::message::{Flow, Message};
use super::state::App;
use crate::error::PlaylistError;
use crate::features::{PlayerEvent, StatusMessage};

impl App {
    /// Handle one message; returns whether the loop keeps running
    pub fn update(&mut self, message: Message) -> Flow {
        match message {
            Message::Input(line) => return self.handle_input(line),
            Message::InputClosed => return Flow::Quit,
            Message::Tick => self.handle_tick(),
            Message::Dialog(request) => self.open_dialog(request),

            Message::StreamReady(outcome) => self.on_stream_ready(outcome),
            Message::TrackResolved(result) => self.on_track_resolved(result),
            Message::ImportProgress(progress) => self.on_import_progress(&progress),
            Message::ImportFinished(result) => self.on_import_finished(result),
            Message::RefreshFinished(summary) => self.on_refresh_finished(summary),

            Message::ClearConfirmed(confirmed) => self.on_clear_confirmed(confirmed),
            Message::RenameAnswered { target, title } => self.on_rename_answered(target, title),
        }
        Flow::Continue
    }

    fn handle_input(&mut self, line: String) -> Flow {
        if let Some(dialog) = self.pending_dialog.take() {
            dialog.answer(&line);
            return Flow::Continue;
        }

        match command::parse(&line) {
            Ok(Some(command)) => self.handle_command(command),
            Ok(None) => Flow::Continue,
            Err(e) => {
                self.print(&e.render().to_string());
                Flow::Continue
            }
        }
    }

    /// Try each handler in order until one handles the command
    fn handle_command(&mut self, command: Command) -> Flow {
        if command == Command::Quit {
            return Flow::Quit;
        }
        tracing::debug!("Command: {:?}", command);

        if let Some(events) = self.handle_playback(&command) {
            self.emit(events);
        } else if let Some(events) = self.handle_playlist(&command) {
            self.emit(events);
        } else if let Some(events) = self.handle_import(&command) {
            self.emit(events);
        } else if let Some(events) = self.handle_window(&command) {
            self.emit_layout(events);
        }
        Flow::Continue
    }

    pub(super) fn print(&mut self, text: &str) {
        if let Err(e) = self.renderer.print(text) {
            tracing::warn!("Render failed: {}", e);
        }
    }
}

fn invalid_position(position: usize) -> Vec<PlayerEvent> {
    vec![PlayerEvent::Status(StatusMessage::error(format!(
        "No track at position {}",
        position
    )))]
}

/// Turn a playlist error into a status message
fn or_status(result: Result<Vec<PlayerEvent>, PlaylistError>) -> Vec<PlayerEvent> {
    result.unwrap_or_else(|e| vec![PlayerEvent::Status(StatusMessage::error(e.to_string()))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PlayListDetail, SongInfo};
    use crate::app::state::SharedOutput;
    use crate::audio::ClockBackend;
    use crate::features::persistence::{LocalStore, PersistedState, StateStore};
    use crate::features::resolver::tests::FakeSource;
    use crate::features::settings::MusicQuality;
    use crate::features::{
        PlayMode, PlayerController, PlaylistState, Resolver, Settings, Track, WidgetLayout,
    };
    use std::sync::Arc;
    use std::time::Duration;

    struct Harness {
        app: App,
        out: SharedOutput,
        state_file: std::path::PathBuf,
        _dir: tempfile::TempDir,
    }

    fn harness(tracks: Vec<Track>, source: FakeSource) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("state.json");
        let resolver = Resolver::new(Arc::new(source), MusicQuality::High, Duration::ZERO);
        let player = PlayerController::new(
            PlaylistState::new(tracks, None, PlayMode::Sequential),
            Box::new(ClockBackend::new(None)),
            Some(resolver),
        );
        let out = SharedOutput::default();
        let app = App::from_parts(
            Settings::default(),
            player,
            WidgetLayout::default(),
            Vec::new(),
            Box::new(LocalStore::new(state_file.clone())),
            Box::new(out.clone()),
            false,
        );
        Harness {
            app,
            out,
            state_file,
            _dir: dir,
        }
    }

    fn tracks(n: usize) -> Vec<Track> {
        (0..n)
            .map(|i| Track::new(format!("t{}", i), "a", format!("http://m/{}.mp3", i)))
            .collect()
    }

    fn input(h: &mut Harness, line: &str) -> Flow {
        h.app.update(Message::Input(line.to_string()))
    }

    /// Deliver the next message a spawned task sends back
    async fn pump(h: &mut Harness) {
        let message = h.app.rx.recv().await.unwrap();
        h.app.update(message);
    }

    /// Answer the dialog opened by the last command
    async fn answer(h: &mut Harness, line: &str) {
        let request = h.app.dialog_rx.recv().await.unwrap();
        h.app.update(Message::Dialog(request));
        input(h, line);
    }

    fn saved(h: &Harness) -> PersistedState {
        LocalStore::new(h.state_file.clone()).load().unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_play_renders_and_persists() {
        let mut h = harness(tracks(2), FakeSource::default());
        assert_eq!(input(&mut h, "play 2"), Flow::Continue);
        assert!(h.out.contents().contains("… t1 - a"));

        pump(&mut h).await;
        assert!(h.out.contents().contains("▶ t1 - a"));
        let state = saved(&h);
        assert_eq!(state.state.current_index, Some(1));
        assert!(state.state.is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_does_not_wait_for_stream() {
        let mut source = FakeSource::default().with_song(1, "slow", Some("http://m/1.mp3"));
        source.url_delay = Some(Duration::from_secs(5));
        let mut h = harness(vec![Track::from_source(1, "slow", "a")], source);

        let started = tokio::time::Instant::now();
        assert_eq!(input(&mut h, "play 1"), Flow::Continue);
        assert!(h.app.player.is_loading());
        assert!(!h.app.player.is_playing());

        // Other commands are handled while the lookup is pending
        input(&mut h, "speed 1.5");
        assert_eq!(h.app.player.speed(), 1.5);
        assert_eq!(started.elapsed(), Duration::ZERO);

        pump(&mut h).await;
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(h.app.player.is_playing());
        assert_eq!(h.app.player.playlist().get(0).unwrap().url, "http://m/1.mp3");
        assert!(h.out.contents().contains("▶ slow - a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_stream_for_previous_track_dropped() {
        let mut source = FakeSource::default()
            .with_song(1, "one", Some("http://m/1.mp3"))
            .with_song(2, "two", Some("http://m/2.mp3"));
        source.url_delay = Some(Duration::from_secs(2));
        let tracks = vec![Track::from_source(1, "one", "a"), Track::from_source(2, "two", "a")];
        let mut h = harness(tracks, source);

        input(&mut h, "play 1");
        input(&mut h, "play 2");
        pump(&mut h).await;
        pump(&mut h).await;

        let playlist = h.app.player.playlist();
        assert_eq!(playlist.current_index(), Some(1));
        assert_eq!(playlist.get(0).unwrap().url, "");
        assert_eq!(playlist.get(1).unwrap().url, "http://m/2.mp3");
        assert!(h.app.player.is_playing());
    }

    #[tokio::test]
    async fn test_bad_input_keeps_running() {
        let mut h = harness(tracks(1), FakeSource::default());
        assert_eq!(input(&mut h, "play 0"), Flow::Continue);
        assert!(h.out.contents().contains("No track at position 0"));
        assert_eq!(input(&mut h, "warp 9"), Flow::Continue);
        assert_eq!(input(&mut h, "quit"), Flow::Quit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_cleared_on_expiry() {
        let mut h = harness(tracks(1), FakeSource::default());
        input(&mut h, "play 0");
        assert!(h.app.toast.is_some());

        h.app.update(Message::Tick);
        assert!(h.app.toast.is_some());

        tokio::time::advance(crate::ui::toast::TOAST_DURATION).await;
        let before = h.out.contents().len();
        h.app.update(Message::Tick);
        assert!(h.app.toast.is_none());
        let redrawn = h.out.contents()[before..].to_string();
        assert!(redrawn.contains("■ Stopped"));
        assert!(!redrawn.contains("No track"));
    }

    #[tokio::test]
    async fn test_clear_asks_first() {
        let mut h = harness(tracks(3), FakeSource::default());
        input(&mut h, "clear");
        let request = h.app.dialog_rx.recv().await.unwrap();
        h.app.update(Message::Dialog(request));
        assert!(h.out.contents().contains("[y/N]"));

        // The answer goes to the dialog, not the command parser
        input(&mut h, "y");
        pump(&mut h).await;
        assert!(h.app.player.playlist().is_empty());
        assert!(saved(&h).playlist.is_empty());
    }

    #[tokio::test]
    async fn test_rename_prompt() {
        let mut h = harness(tracks(2), FakeSource::default());
        input(&mut h, "rename 2");
        answer(&mut h, "Night Drive").await;
        pump(&mut h).await;
        assert_eq!(h.app.player.playlist().get(1).unwrap().title, "Night Drive");
    }

    #[tokio::test]
    async fn test_rename_follows_track_moved_before_answer() {
        let mut h = harness(tracks(3), FakeSource::default());
        input(&mut h, "rename 3");
        answer(&mut h, "Night Drive").await;
        // Queued ahead of the answer
        input(&mut h, "move 3 1");
        pump(&mut h).await;

        let titles: Vec<_> = h
            .app
            .player
            .playlist()
            .tracks()
            .iter()
            .map(|t| t.title.clone())
            .collect();
        assert_eq!(titles, vec!["Night Drive", "t0", "t1"]);
    }

    #[tokio::test]
    async fn test_rename_of_deleted_track_ignored() {
        let mut h = harness(tracks(2), FakeSource::default());
        input(&mut h, "rename 2");
        answer(&mut h, "Night Drive").await;
        input(&mut h, "delete 2");
        pump(&mut h).await;

        assert_eq!(h.app.player.playlist().len(), 1);
        assert_eq!(h.app.player.playlist().get(0).unwrap().title, "t0");
        assert!(h.out.contents().contains("t1 is no longer in the playlist"));
    }

    #[tokio::test]
    async fn test_add_song_by_link() {
        let source = FakeSource::default().with_song(42, "Sunny", Some("http://m/42.mp3"));
        let mut h = harness(Vec::new(), source);
        input(&mut h, "add https://music.example.com/#/song?id=42");
        pump(&mut h).await;
        let playlist = h.app.player.playlist();
        assert_eq!(playlist.len(), 1);
        assert_eq!(playlist.get(0).unwrap().source_id, Some(42));

        input(&mut h, "add 42");
        assert!(h.out.contents().contains("Already in playlist"));
        assert_eq!(h.app.player.playlist().len(), 1);
    }

    #[tokio::test]
    async fn test_import_records_history() {
        let mut source = FakeSource::default()
            .with_song(1, "one", Some("http://m/1.mp3"))
            .with_song(2, "two", Some("http://m/2.mp3"));
        source.playlists.insert(
            9,
            PlayListDetail {
                id: 9,
                name: "Mix".into(),
                songs: vec![
                    SongInfo { id: 1, ..Default::default() },
                    SongInfo { id: 2, ..Default::default() },
                ],
            },
        );
        let mut h = harness(Vec::new(), source);
        h.app.settings.playback.auto_play_on_import = true;

        input(&mut h, "import 9");
        loop {
            let message = h.app.rx.recv().await.unwrap();
            let done = matches!(message, Message::ImportFinished(_));
            h.app.update(message);
            if done {
                break;
            }
        }
        // Auto-play has queued the first stream
        assert!(h.app.player.is_loading());
        pump(&mut h).await;

        assert_eq!(h.app.player.playlist().len(), 2);
        assert!(h.app.player.is_playing());
        let out = h.out.contents();
        assert!(out.contains("Importing Mix (2 songs)"));
        assert!(out.contains("[2/2] two - Singer"));

        let state = saved(&h);
        assert_eq!(state.state.import_history.len(), 1);
        assert_eq!(state.state.import_history[0].imported, 2);
    }

    #[tokio::test]
    async fn test_quality_updates_resolver_and_settings_file() {
        let mut h = harness(tracks(1), FakeSource::default());
        let settings_file = h._dir.path().join("settings.json");
        h.app.settings_file = Some(settings_file.clone());

        input(&mut h, "quality lossless");
        assert_eq!(
            h.app.player.resolver().unwrap().quality(),
            MusicQuality::Lossless
        );
        assert!(h.out.contents().contains("Quality set to"));
        assert_eq!(saved(&h).state.cfg.quality, MusicQuality::Lossless);
        let written = Settings::load_from_file(&settings_file).unwrap();
        assert_eq!(written.quality, MusicQuality::Lossless);
    }

    #[tokio::test]
    async fn test_drag_persists_position() {
        let mut h = harness(tracks(1), FakeSource::default());
        input(&mut h, "drag 40 30");
        let state = saved(&h);
        let position = state.state.positions["player"];
        assert_eq!((position.x, position.y), (40.0, 30.0));
        assert!(h.out.contents().contains("[player at 40,30]"));
    }

    #[tokio::test]
    async fn test_viewport_shrink_moves_player() {
        let mut h = harness(tracks(1), FakeSource::default());
        input(&mut h, "drag 900 500");
        input(&mut h, "viewport 800 400");

        assert!(h.out.contents().contains("Viewport 800x400, 1 widgets moved"));
        let position = saved(&h).state.positions["player"];
        assert_eq!((position.x, position.y), (480.0, 280.0));
    }

    #[tokio::test]
    async fn test_collapse_and_panels() {
        let mut h = harness(tracks(1), FakeSource::default());
        input(&mut h, "show lyrics");
        assert!(h.app.layout.panels().lyrics);

        input(&mut h, "collapse");
        assert!(h.app.layout.is_collapsed());
        assert!(!h.app.layout.panels().lyrics);
        let out = h.out.contents();
        assert!(out.contains("[Lyrics closed]"));
        assert!(out.contains("[player collapsed]"));

        input(&mut h, "show playlist");
        assert!(!h.app.layout.is_collapsed());
        assert!(h.out.contents().contains("[player expanded]"));
        assert!(h.out.contents().contains("[Playlist opened]"));

        input(&mut h, "hide");
        assert!(!h.app.layout.panels().playlist);
        assert!(h.out.contents().contains("[Playlist closed]"));
    }
}
