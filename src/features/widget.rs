//! Floating widget layout
//!
//! Stored positions per widget id, panel visibility, the collapsed flag and
//! pointer-drag gestures. Positions always keep the whole widget inside the
//! viewport.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Id of the main player widget
pub const PLAYER_WIDGET: &str = "player";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Playlist,
    Lyrics,
    Settings,
}

impl Panel {
    pub const ALL: [Panel; 3] = [Panel::Playlist, Panel::Lyrics, Panel::Settings];

    pub fn display_name(&self) -> &'static str {
        match self {
            Panel::Playlist => "Playlist",
            Panel::Lyrics => "Lyrics",
            Panel::Settings => "Settings",
        }
    }
}

impl std::str::FromStr for Panel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "playlist" | "list" => Ok(Panel::Playlist),
            "lyrics" | "lyric" => Ok(Panel::Lyrics),
            "settings" | "cfg" => Ok(Panel::Settings),
            other => Err(format!("unknown panel: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanelVisibility {
    pub playlist: bool,
    pub lyrics: bool,
    pub settings: bool,
}

impl PanelVisibility {
    pub fn is_open(&self, panel: Panel) -> bool {
        match panel {
            Panel::Playlist => self.playlist,
            Panel::Lyrics => self.lyrics,
            Panel::Settings => self.settings,
        }
    }

    fn slot(&mut self, panel: Panel) -> &mut bool {
        match panel {
            Panel::Playlist => &mut self.playlist,
            Panel::Lyrics => &mut self.lyrics,
            Panel::Settings => &mut self.settings,
        }
    }
}

/// Change produced by a layout operation
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEvent {
    PanelChanged { panel: Panel, open: bool },
    Moved { id: String, position: Position },
    /// Gesture finished; the position should be persisted
    DragEnded { id: String, position: Position },
    /// Player shrunk to its transport line, or expanded again
    Collapsed(bool),
}

#[derive(Debug, Clone)]
struct DragCapture {
    id: String,
    /// Pointer position relative to the widget origin
    offset: Position,
}

#[derive(Debug, Clone)]
pub struct WidgetLayout {
    positions: BTreeMap<String, Position>,
    sizes: BTreeMap<String, Size>,
    panels: PanelVisibility,
    collapsed: bool,
    viewport: Size,
    drag: Option<DragCapture>,
}

impl Default for WidgetLayout {
    fn default() -> Self {
        Self::new(Size::default())
    }
}

impl WidgetLayout {
    pub fn new(viewport: Size) -> Self {
        let mut sizes = BTreeMap::new();
        sizes.insert(PLAYER_WIDGET.to_string(), Size::new(320.0, 120.0));
        Self {
            positions: BTreeMap::new(),
            sizes,
            panels: PanelVisibility::default(),
            collapsed: false,
            viewport,
            drag: None,
        }
    }

    /// Layout restored from persisted positions
    pub fn with_positions(mut self, positions: BTreeMap<String, Position>) -> Self {
        self.positions = positions;
        self.reclamp();
        self
    }

    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    pub fn position(&self, id: &str) -> Position {
        self.positions.get(id).copied().unwrap_or_default()
    }

    pub fn panels(&self) -> PanelVisibility {
        self.panels
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    fn size(&self, id: &str) -> Size {
        self.sizes
            .get(id)
            .copied()
            .unwrap_or_else(|| Size::new(0.0, 0.0))
    }

    fn clamp(&self, id: &str, p: Position) -> Position {
        let size = self.size(id);
        let max_x = (self.viewport.width - size.width).max(0.0);
        let max_y = (self.viewport.height - size.height).max(0.0);
        Position::new(p.x.clamp(0.0, max_x), p.y.clamp(0.0, max_y))
    }

    fn reclamp(&mut self) {
        let ids: Vec<String> = self.positions.keys().cloned().collect();
        for id in ids {
            let clamped = self.clamp(&id, self.positions[&id]);
            self.positions.insert(id, clamped);
        }
    }

    /// Viewport resized; returns the widgets that had to move
    pub fn set_viewport(&mut self, viewport: Size) -> Vec<LayoutEvent> {
        self.viewport = viewport;
        let before = self.positions.clone();
        self.reclamp();
        self.positions
            .iter()
            .filter(|(id, p)| before.get(*id) != Some(*p))
            .map(|(id, p)| LayoutEvent::Moved {
                id: id.clone(),
                position: *p,
            })
            .collect()
    }

    /// Place a widget directly, e.g. from a command
    pub fn move_to(&mut self, id: &str, position: Position) -> Vec<LayoutEvent> {
        let position = self.clamp(id, position);
        if self.positions.get(id) == Some(&position) {
            return Vec::new();
        }
        self.positions.insert(id.to_string(), position);
        vec![LayoutEvent::Moved {
            id: id.to_string(),
            position,
        }]
    }

    // ============ Panels ============

    pub fn toggle_panel(&mut self, panel: Panel) -> Vec<LayoutEvent> {
        let open = !self.panels.is_open(panel);
        self.set_panel(panel, open)
    }

    pub fn show_panel(&mut self, panel: Panel) -> Vec<LayoutEvent> {
        self.set_panel(panel, true)
    }

    pub fn hide_all(&mut self) -> Vec<LayoutEvent> {
        Panel::ALL
            .into_iter()
            .flat_map(|panel| self.set_panel(panel, false))
            .collect()
    }

    /// Collapsing closes every panel; opening a panel expands again
    pub fn toggle_collapsed(&mut self) -> Vec<LayoutEvent> {
        let mut events = if self.collapsed {
            Vec::new()
        } else {
            self.hide_all()
        };
        self.collapsed = !self.collapsed;
        events.push(LayoutEvent::Collapsed(self.collapsed));
        events
    }

    fn set_panel(&mut self, panel: Panel, open: bool) -> Vec<LayoutEvent> {
        let slot = self.panels.slot(panel);
        if *slot == open {
            return Vec::new();
        }
        *slot = open;
        tracing::debug!("{} panel open={}", panel.display_name(), open);
        let mut events = Vec::new();
        if open && self.collapsed {
            self.collapsed = false;
            events.push(LayoutEvent::Collapsed(false));
        }
        events.push(LayoutEvent::PanelChanged { panel, open });
        events
    }

    // ============ Drag ============

    /// Capture the pointer on a widget
    pub fn begin_drag(&mut self, id: &str, pointer: Position) {
        let origin = self.position(id);
        self.drag = Some(DragCapture {
            id: id.to_string(),
            offset: Position::new(pointer.x - origin.x, pointer.y - origin.y),
        });
    }

    /// Pointer moved; ignored without an active gesture
    pub fn drag_to(&mut self, pointer: Position) -> Vec<LayoutEvent> {
        let Some(capture) = self.drag.clone() else {
            return Vec::new();
        };
        let target = Position::new(pointer.x - capture.offset.x, pointer.y - capture.offset.y);
        self.move_to(&capture.id, target)
    }

    /// Release the capture, reporting the final position
    pub fn end_drag(&mut self) -> Vec<LayoutEvent> {
        let Some(capture) = self.drag.take() else {
            return Vec::new();
        };
        let position = self.position(&capture.id);
        vec![LayoutEvent::DragEnded {
            id: capture.id,
            position,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> WidgetLayout {
        WidgetLayout::new(Size::new(800.0, 600.0))
    }

    #[test]
    fn test_drag_moves_with_pointer_offset() {
        let mut l = layout();
        l.move_to(PLAYER_WIDGET, Position::new(100.0, 100.0));
        l.begin_drag(PLAYER_WIDGET, Position::new(110.0, 105.0));
        assert!(l.is_dragging());

        let events = l.drag_to(Position::new(210.0, 155.0));
        assert_eq!(
            events,
            vec![LayoutEvent::Moved {
                id: PLAYER_WIDGET.into(),
                position: Position::new(200.0, 150.0)
            }]
        );

        let events = l.end_drag();
        assert_eq!(
            events,
            vec![LayoutEvent::DragEnded {
                id: PLAYER_WIDGET.into(),
                position: Position::new(200.0, 150.0)
            }]
        );
        assert!(!l.is_dragging());
    }

    #[test]
    fn test_drag_clamps_to_viewport() {
        let mut l = layout();
        l.begin_drag(PLAYER_WIDGET, Position::new(0.0, 0.0));
        l.drag_to(Position::new(5000.0, -40.0));
        assert_eq!(l.position(PLAYER_WIDGET), Position::new(480.0, 0.0));
    }

    #[test]
    fn test_pointer_moves_without_capture_ignored() {
        let mut l = layout();
        assert!(l.drag_to(Position::new(50.0, 50.0)).is_empty());
        assert!(l.end_drag().is_empty());
        assert_eq!(l.position(PLAYER_WIDGET), Position::default());
    }

    #[test]
    fn test_viewport_shrink_reclamps() {
        let mut l = layout();
        l.move_to(PLAYER_WIDGET, Position::new(450.0, 400.0));
        let events = l.set_viewport(Size::new(500.0, 300.0));
        assert_eq!(l.position(PLAYER_WIDGET), Position::new(180.0, 180.0));
        assert_eq!(events.len(), 1);
        assert!(l.set_viewport(Size::new(500.0, 300.0)).is_empty());
    }

    #[test]
    fn test_restored_positions_are_clamped() {
        let mut saved = BTreeMap::new();
        saved.insert(PLAYER_WIDGET.to_string(), Position::new(-20.0, 9000.0));
        let l = layout().with_positions(saved);
        assert_eq!(l.position(PLAYER_WIDGET), Position::new(0.0, 480.0));
    }

    #[test]
    fn test_panels() {
        let mut l = layout();
        assert_eq!(
            l.toggle_panel(Panel::Lyrics),
            vec![LayoutEvent::PanelChanged { panel: Panel::Lyrics, open: true }]
        );
        assert!(l.show_panel(Panel::Lyrics).is_empty());
        l.show_panel(Panel::Settings);
        assert!(l.panels().lyrics && l.panels().settings);
        assert_eq!(l.hide_all().len(), 2);
        assert_eq!(l.panels(), PanelVisibility::default());
    }

    #[test]
    fn test_collapse_hides_panels_until_one_opens() {
        let mut l = layout();
        l.show_panel(Panel::Playlist);
        assert_eq!(
            l.toggle_collapsed(),
            vec![
                LayoutEvent::PanelChanged { panel: Panel::Playlist, open: false },
                LayoutEvent::Collapsed(true),
            ]
        );
        assert!(l.is_collapsed());
        assert_eq!(
            l.toggle_panel(Panel::Lyrics),
            vec![
                LayoutEvent::Collapsed(false),
                LayoutEvent::PanelChanged { panel: Panel::Lyrics, open: true },
            ]
        );
        assert!(!l.is_collapsed());

        l.toggle_collapsed();
        assert_eq!(l.toggle_collapsed(), vec![LayoutEvent::Collapsed(false)]);
        assert_eq!(l.panels(), PanelVisibility::default());
    }

    #[test]
    fn test_panel_from_str() {
        assert_eq!("Lyrics".parse::<Panel>(), Ok(Panel::Lyrics));
        assert!("queue".parse::<Panel>().is_err());
    }
}
