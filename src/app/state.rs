// src/app/state.rs
//! Application state

use std::io::Write;
use std::path::PathBuf;

use tokio::sync::mpsc;

use super::message::Message;
use crate::features::dialog::DialogReceiver;
use crate::features::persistence::{self, ImportRecord, PersistedState, StateStore};
use crate::features::{
    DialogRequest, Dialogs, PlayerController, PlayerEvent, Settings, WidgetLayout,
};
use crate::ui::{Renderer, Toast};

/// Output sink shared with the renderer
pub type Output = Box<dyn Write + Send>;

pub struct App {
    pub(super) settings: Settings,
    /// Settings file read at startup; rewritten when a setting changes
    pub(super) settings_file: Option<PathBuf>,
    pub(super) player: PlayerController,
    pub(super) layout: WidgetLayout,
    pub(super) history: Vec<ImportRecord>,
    pub(super) store: Box<dyn StateStore>,
    pub(super) renderer: Renderer<Output>,
    pub(super) dialogs: Dialogs,
    pub(super) dialog_rx: DialogReceiver,
    /// Dialog answered by the next input line
    pub(super) pending_dialog: Option<DialogRequest>,
    pub(super) tx: mpsc::UnboundedSender<Message>,
    pub(super) rx: mpsc::UnboundedReceiver<Message>,
    pub(super) toast: Option<Toast>,
    /// The saved session was playing when it ended
    pub(super) resume_on_start: bool,
}

impl App {
    pub fn from_parts(
        settings: Settings,
        player: PlayerController,
        layout: WidgetLayout,
        history: Vec<ImportRecord>,
        store: Box<dyn StateStore>,
        out: Output,
        ansi: bool,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (dialogs, dialog_rx) = Dialogs::channel();
        let mut renderer = Renderer::new(out, ansi);
        renderer.set_show_lyrics(settings.display.show_lyrics);
        Self {
            settings,
            settings_file: None,
            player,
            layout,
            history,
            store,
            renderer,
            dialogs,
            dialog_rx,
            pending_dialog: None,
            tx,
            rx,
            toast: None,
            resume_on_start: false,
        }
    }

    /// Sender for spawned tasks reporting back to the loop
    pub fn sender(&self) -> mpsc::UnboundedSender<Message> {
        self.tx.clone()
    }

    /// Render a batch of events, remember the latest toast and save.
    ///
    /// Stream work queued by the controller is started here.
    pub(super) fn emit(&mut self, events: Vec<PlayerEvent>) {
        if let Some(job) = self.player.take_stream_job() {
            self.spawn_stream_job(job);
        }
        if events.is_empty() {
            return;
        }
        if let Err(e) = self.renderer.apply(&events, &self.player) {
            tracing::warn!("Render failed: {}", e);
        }
        for event in &events {
            if let PlayerEvent::Status(status) = event {
                self.toast = Some(Toast::from(status.clone()));
            }
        }
        if events.iter().any(|e| !matches!(e, PlayerEvent::Status(_))) {
            self.persist();
        }
    }

    pub(super) fn status(&mut self, status: crate::features::StatusMessage) {
        self.emit(vec![PlayerEvent::Status(status)]);
    }

    pub(super) fn draw_now_playing(&mut self) {
        if let Err(e) = self.renderer.draw_transport(&self.player, self.toast.as_ref()) {
            tracing::warn!("Render failed: {}", e);
        }
    }

    pub(super) fn snapshot(&self) -> PersistedState {
        PersistedState::capture(&self.player, &self.settings, &self.history, &self.layout)
    }

    pub(super) fn persist(&mut self) {
        let state = self.snapshot();
        if let Err(e) = self.store.save(&state) {
            tracing::error!("Failed to save state to {}: {}", self.store.describe(), e);
        }
    }

    pub(super) fn record_import(&mut self, record: ImportRecord) {
        let limit = self.settings.import.history_limit;
        persistence::record_import(&mut self.history, record, limit);
    }
}

/// In-memory output
#[cfg(test)]
#[derive(Clone, Default)]
pub struct SharedOutput(pub std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

#[cfg(test)]
impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
