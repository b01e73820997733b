// src/app/update/window.rs
//! Widget layout and dialog handlers

use crate::app::command::Command;
use crate::app::state::App;
use crate::features::widget::{PLAYER_WIDGET, Size};
use crate::features::{DialogRequest, LayoutEvent, Position, StatusMessage};

impl App {
    /// Handle panel, drag and viewport commands
    pub(super) fn handle_window(&mut self, command: &Command) -> Option<Vec<LayoutEvent>> {
        match command {
            Command::Panel { panel } => Some(self.layout.toggle_panel(*panel)),
            Command::Show { panel } => Some(self.layout.show_panel(*panel)),
            Command::Hide => Some(self.layout.hide_all()),
            Command::Collapse => Some(self.layout.toggle_collapsed()),
            Command::Viewport { width, height } => {
                let events = self.layout.set_viewport(Size::new(*width, *height));
                let size = self.layout.viewport();
                self.status(StatusMessage::info(format!(
                    "Viewport {:.0}x{:.0}, {} widgets moved",
                    size.width,
                    size.height,
                    events.len()
                )));
                Some(events)
            }
            Command::Drag { x, y } => {
                // Grab the widget at its origin and release at the target
                let origin = self.layout.position(PLAYER_WIDGET);
                self.layout.begin_drag(PLAYER_WIDGET, origin);
                let mut events = self.layout.drag_to(Position::new(*x, *y));
                events.extend(self.layout.end_drag());
                Some(events)
            }
            _ => None,
        }
    }

    pub(super) fn emit_layout(&mut self, events: Vec<LayoutEvent>) {
        if events.is_empty() {
            return;
        }
        self.renderer
            .set_show_lyrics(self.settings.display.show_lyrics && !self.layout.is_collapsed());
        if let Err(e) = self
            .renderer
            .apply_layout(&events, &self.player, &self.settings)
        {
            tracing::warn!("Render failed: {}", e);
        }
        // Positions are saved once a gesture is over, not on every move
        let moved = events
            .iter()
            .any(|e| matches!(e, LayoutEvent::DragEnded { .. } | LayoutEvent::Moved { .. }));
        if moved && !self.layout.is_dragging() {
            self.persist();
        }
    }

    /// Show a dialog; the next input line answers it
    pub(super) fn open_dialog(&mut self, request: DialogRequest) {
        if let Err(e) = self.renderer.draw_dialog(&request) {
            tracing::warn!("Render failed: {}", e);
        }
        if let Some(previous) = self.pending_dialog.replace(request) {
            previous.cancel();
        }
    }
}
