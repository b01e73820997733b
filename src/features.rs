//! Feature modules - player logic separated from rendering
//!
//! Each feature module contains the core logic for a specific functionality.
//! Features should not depend on UI components directly.

pub mod dialog;
pub mod link;
pub mod lyrics;
pub mod persistence;
pub mod player;
pub mod playlist;
pub mod resolver;
pub mod settings;
pub mod widget;

pub use dialog::{DialogRequest, Dialogs};
pub use player::{PlayerController, PlayerEvent, StatusLevel, StatusMessage};
pub use playlist::{PlaylistState, Track};
pub use resolver::Resolver;
pub use settings::{PlayMode, Settings};
pub use widget::{LayoutEvent, Panel, Position, WidgetLayout};
