//! External music API
//!
//! `MusicSource` is the seam between resolution logic and the network; the
//! HTTP implementation lives in `music_api`.

pub mod music_api;

use async_trait::async_trait;

pub use music_api::MusicApi;
pub use music_api::model::{PlayListDetail, SongInfo, SongUrl};

use crate::error::ResolutionError;
use crate::features::settings::MusicQuality;

/// The lookups the player needs from a music service
#[async_trait]
pub trait MusicSource: Send + Sync {
    /// Title, artist, album, cover and duration
    async fn song_detail(&self, id: u64) -> Result<SongInfo, ResolutionError>;

    /// Playable stream URL at the requested quality
    async fn song_url(&self, id: u64, quality: MusicQuality) -> Result<SongUrl, ResolutionError>;

    /// Raw LRC text; `Ok(None)` when the song has no lyrics
    async fn song_lyric(&self, id: u64) -> Result<Option<String>, ResolutionError>;

    /// Playlist name and its song stubs
    async fn playlist_detail(&self, id: u64) -> Result<PlayListDetail, ResolutionError>;
}
