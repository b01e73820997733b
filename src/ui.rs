//! Rendering layer
//!
//! Rendering only subscribes to state: it receives the change events produced
//! by the player and layout and redraws the regions they touch.
//!
//! - `render`: terminal renderer with per-region redraws
//! - `toast`: transient status notifications

pub mod render;
pub mod toast;

pub use render::Renderer;
pub use toast::Toast;
