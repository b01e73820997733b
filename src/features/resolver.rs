//! Song resolver
//!
//! Turns references into playable `Track`s through a `MusicSource`: single
//! lookups, stream URL refreshes, bulk playlist import and refresh-all.
//! Bulk operations run one track at a time with a pause in between so the
//! remote service is not hammered; a failing track never aborts the batch.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use super::link::{TrackRef, title_from_url};
use super::playlist::Track;
use crate::api::{MusicSource, SongInfo};
use crate::error::ResolutionError;
use crate::features::settings::MusicQuality;

/// Progress update sent during a bulk operation
#[derive(Debug, Clone, PartialEq)]
pub enum ImportProgress {
    Started { name: String, total: usize },
    Resolved { current: usize, total: usize, title: String },
    Failed { current: usize, total: usize, id: u64, error: String },
    /// Already in the playlist or earlier in the same batch
    Skipped { current: usize, total: usize, id: u64 },
}

pub type ProgressSender = mpsc::UnboundedSender<ImportProgress>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ImportProgress>;

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Outcome of a playlist import
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportSummary {
    pub playlist_id: u64,
    pub name: String,
    /// Successfully resolved tracks in playlist order
    pub tracks: Vec<Track>,
    pub success_count: usize,
    pub fail_count: usize,
    pub skipped_duplicates: usize,
}

/// Outcome of refreshing stream URLs, keyed by external id
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefreshSummary {
    pub urls: Vec<(u64, String)>,
    pub success_count: usize,
    pub fail_count: usize,
}

#[derive(Clone)]
pub struct Resolver {
    source: Arc<dyn MusicSource>,
    quality: MusicQuality,
    delay: Duration,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("source", &"<MusicSource>")
            .field("quality", &self.quality)
            .field("delay", &self.delay)
            .finish()
    }
}

impl Resolver {
    pub fn new(source: Arc<dyn MusicSource>, quality: MusicQuality, delay: Duration) -> Self {
        Self {
            source,
            quality,
            delay,
        }
    }

    pub fn quality(&self) -> MusicQuality {
        self.quality
    }

    /// Quality for stream lookups from now on
    pub fn set_quality(&mut self, quality: MusicQuality) {
        self.quality = quality;
    }

    /// Resolve a pasted reference into a playable track
    pub async fn resolve(&self, reference: &TrackRef) -> Result<Track, ResolutionError> {
        match reference {
            TrackRef::Source(id) => self.resolve_id(*id).await,
            TrackRef::Direct(url) => {
                let mut track = Track::new(title_from_url(url), "", url.clone());
                track.url_refreshed_at = Some(Utc::now());
                Ok(track)
            }
        }
    }

    /// Detail, stream URL and lyrics for one song id
    pub async fn resolve_id(&self, id: u64) -> Result<Track, ResolutionError> {
        let info = self.source.song_detail(id).await?;
        self.complete(info).await
    }

    /// Fill in stream URL and lyrics for already known metadata
    async fn complete(&self, info: SongInfo) -> Result<Track, ResolutionError> {
        let id = info.id;
        let url = self.source.song_url(id, self.quality).await?;
        if url.url.is_empty() {
            return Err(ResolutionError::NoStreamUrl(id));
        }

        let lyrics = match self.source.song_lyric(id).await {
            Ok(lyrics) => lyrics,
            Err(e) => {
                tracing::warn!("Lyrics lookup failed for {}: {}", id, e);
                None
            }
        };

        let mut track = Track::from_source(id, info.name, info.singer);
        track.url = url.url;
        track.url_refreshed_at = Some(Utc::now());
        track.lyrics = lyrics;
        track.cover = Some(info.pic_url).filter(|s| !s.is_empty());
        track.album = Some(info.album).filter(|s| !s.is_empty());
        track.duration_ms = Some(info.duration).filter(|&d| d > 0);
        tracing::info!("Resolved {} ({} kbps)", track.display_name(), url.rate / 1000);
        Ok(track)
    }

    /// Fresh stream URL for a track with an external id
    pub async fn refresh_stream(&self, id: u64) -> Result<String, ResolutionError> {
        let url = self.source.song_url(id, self.quality).await?;
        if url.url.is_empty() {
            return Err(ResolutionError::NoStreamUrl(id));
        }
        tracing::debug!("Refreshed stream url for {}", id);
        Ok(url.url)
    }

    async fn pause_between(&self, index: usize) {
        if index > 0 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Import every song of a playlist.
    ///
    /// Ids in `existing` and repeats within the playlist are skipped. Only a
    /// failed playlist lookup is an error; per-song failures are counted.
    pub async fn import_playlist(
        &self,
        playlist_id: u64,
        existing: HashSet<u64>,
        progress: Option<ProgressSender>,
    ) -> Result<ImportSummary, ResolutionError> {
        let detail = self.source.playlist_detail(playlist_id).await?;
        let total = detail.songs.len();
        let report = |p: ImportProgress| {
            if let Some(tx) = &progress {
                let _ = tx.send(p);
            }
        };
        report(ImportProgress::Started {
            name: detail.name.clone(),
            total,
        });
        tracing::info!("Importing playlist {} ({} songs)", detail.name, total);

        let mut summary = ImportSummary {
            playlist_id: detail.id,
            name: detail.name,
            ..Default::default()
        };
        let mut seen = existing;
        let mut requests = 0;

        for (i, stub) in detail.songs.into_iter().enumerate() {
            let current = i + 1;
            let id = stub.id;
            if !seen.insert(id) {
                summary.skipped_duplicates += 1;
                report(ImportProgress::Skipped { current, total, id });
                continue;
            }

            self.pause_between(requests).await;
            requests += 1;

            let result = if stub.name.is_empty() {
                self.resolve_id(id).await
            } else {
                self.complete(stub).await
            };

            match result {
                Ok(track) => {
                    summary.success_count += 1;
                    report(ImportProgress::Resolved {
                        current,
                        total,
                        title: track.display_name(),
                    });
                    summary.tracks.push(track);
                }
                Err(e) => {
                    tracing::warn!("Failed to import song {}: {}", id, e);
                    summary.fail_count += 1;
                    report(ImportProgress::Failed {
                        current,
                        total,
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Import of {} finished: {} ok, {} failed, {} duplicates",
            summary.name,
            summary.success_count,
            summary.fail_count,
            summary.skipped_duplicates
        );
        Ok(summary)
    }

    /// Refresh stream URLs for the given external ids, one at a time
    pub async fn refresh_all(&self, ids: Vec<u64>) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        let unique: Vec<u64> = {
            let mut seen = HashSet::new();
            ids.into_iter().filter(|id| seen.insert(*id)).collect()
        };

        for (i, id) in unique.into_iter().enumerate() {
            self.pause_between(i).await;
            match self.refresh_stream(id).await {
                Ok(url) => {
                    summary.success_count += 1;
                    summary.urls.push((id, url));
                }
                Err(e) => {
                    tracing::warn!("Failed to refresh {}: {}", id, e);
                    summary.fail_count += 1;
                }
            }
        }
        summary
    }
}
