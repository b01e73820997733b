//! Media element abstraction
//!
//! - `MediaBackend`: what the player controller needs from a media element
//! - `StreamProbe`: checks a stream answers; runs off the event loop
//! - `ClockBackend`: a headless element that keeps a speed-aware playback
//!   clock, probing streams over HTTP

mod clock;

use std::sync::Arc;

use async_trait::async_trait;

pub use clock::ClockBackend;

use crate::error::PlaybackError;

/// Coarse state of the media element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

/// Reachability check for a stream URL
#[async_trait]
pub trait StreamProbe: Send + Sync {
    async fn check(&self, url: &str) -> Result<(), PlaybackError>;
}

pub trait MediaBackend: Send {
    /// Probe matching this element, handed to background stream preparation
    fn probe(&self) -> Arc<dyn StreamProbe>;

    /// Point the element at a checked stream; `duration` in seconds when known
    fn load(&mut self, url: &str, duration: Option<f64>) -> Result<(), PlaybackError>;

    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    /// Drop the loaded stream
    fn stop(&mut self);

    fn seek(&mut self, position: f64);

    fn set_speed(&mut self, speed: f32);

    /// Current position in seconds
    fn position(&self) -> f64;

    /// The loaded stream played to its end
    fn is_ended(&self) -> bool;

    fn status(&self) -> PlaybackStatus;
}
