//! Main application module
//!
//! `App` owns the player, layout and store and runs a single event loop over
//! input lines, task results, dialog requests and a position tick.

mod cli;
mod command;
mod message;
mod state;
mod update;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

pub use cli::Cli;
pub use state::App;

use message::{Flow, Message};

use crate::api::MusicApi;
use crate::audio::ClockBackend;
use crate::features::persistence::{self, PersistedState};
use crate::features::{PlayerController, PlaylistState, Resolver, Settings, WidgetLayout};

/// Position poll interval
const TICK: Duration = Duration::from_millis(250);

impl App {
    /// Build the application from flags, the settings file and saved state
    pub fn new(cli: &Cli) -> Result<Self> {
        // 1. Settings file first so the store location is known
        let settings_path = Settings::file_path();
        let file_settings = settings_path.as_ref().and_then(|path| {
            Settings::load_from_file(path)
                .map_err(|e| tracing::debug!("No settings file at {:?}: {}", path, e))
                .ok()
        });
        let settings_file = settings_path.filter(|_| file_settings.is_some());
        let mut boot = file_settings.clone().unwrap_or_default();
        cli.apply(&mut boot);

        let store = persistence::open_store(boot.host.as_ref(), cli.state_file.clone())
            .context("Failed to open state store")?;
        tracing::info!("Using {}", store.describe());

        // 2. Saved session; a broken document starts fresh
        let saved = match store.load() {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!("Ignoring unreadable saved state: {}", e);
                None
            }
        };
        let has_saved = saved.is_some();
        let PersistedState { playlist, state } = saved.unwrap_or_default();

        let mut settings = file_settings.unwrap_or_else(|| state.cfg.clone());
        cli.apply(&mut settings);

        // 3. Music service and media element
        let api = match MusicApi::new(&settings.api, settings.network.proxy_url()) {
            Ok(api) => Some(api),
            Err(e) => {
                tracing::warn!("Music API unavailable: {}", e);
                None
            }
        };
        let backend = ClockBackend::new(api.as_ref().map(|a| a.http().clone()));
        let resolver = api.map(|api| {
            Resolver::new(
                Arc::new(api),
                settings.quality,
                Duration::from_millis(settings.import.delay_ms),
            )
        });

        // 4. Restore the session
        let playlist = PlaylistState::new(playlist, state.current_index, state.play_mode);
        let mut player = PlayerController::new(playlist, Box::new(backend), resolver);
        let speed = if has_saved {
            state.playback_speed
        } else {
            settings.playback.default_speed
        };
        player.restore(speed, state.current_lyric_index);
        let layout = WidgetLayout::default().with_positions(state.positions);

        tracing::info!(
            "Restored {} tracks, current {:?}",
            player.playlist().len(),
            player.playlist().current_index()
        );

        let mut app = Self::from_parts(
            settings,
            player,
            layout,
            state.import_history,
            store,
            Box::new(std::io::stdout()),
            !cli.no_color,
        );
        app.settings_file = settings_file;
        app.resume_on_start = state.is_playing;
        Ok(app)
    }

    /// Run until `quit` or end of input
    pub async fn run(mut self) -> Result<()> {
        spawn_input_reader(self.sender());

        if let Err(e) = self.renderer.draw_all(&self.player, &self.layout) {
            tracing::warn!("Render failed: {}", e);
        }
        if self.resume_on_start {
            let events = self.player.resume();
            self.emit(events);
        }

        let mut tick = tokio::time::interval(TICK);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let message = tokio::select! {
                Some(message) = self.rx.recv() => message,
                Some(request) = self.dialog_rx.recv() => Message::Dialog(request),
                _ = tick.tick() => Message::Tick,
            };
            if self.update(message) == Flow::Quit {
                break;
            }
        }

        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if let Some(dialog) = self.pending_dialog.take() {
            dialog.cancel();
        }
        self.persist();
        self.store.flush().context("Failed to write saved state")?;
        tracing::info!("Saved session to {}", self.store.describe());
        Ok(())
    }
}

fn spawn_input_reader(tx: tokio::sync::mpsc::UnboundedSender<Message>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(Message::Input(line)).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    let _ = tx.send(Message::InputClosed);
                    break;
                }
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    let _ = tx.send(Message::InputClosed);
                    break;
                }
            }
        }
    });
}
