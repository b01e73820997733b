//! Headless media element
//!
//! `HttpProbe` verifies a stream answers before it is "played"; the element
//! itself tracks position from a monotonic clock scaled by the playback
//! speed.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use tokio::time::Instant;

use super::{MediaBackend, PlaybackStatus, StreamProbe};
use crate::error::PlaybackError;

/// Two-byte ranged GET against the stream; skipped without a client
#[derive(Debug, Clone, Default)]
pub struct HttpProbe {
    http: Option<Client>,
}

impl HttpProbe {
    pub fn new(http: Option<Client>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl StreamProbe for HttpProbe {
    async fn check(&self, url: &str) -> Result<(), PlaybackError> {
        if url.is_empty() {
            return Err(PlaybackError::EmptyUrl);
        }
        let Some(client) = &self.http else {
            return Ok(());
        };
        let response = client
            .get(url)
            .header(header::RANGE, "bytes=0-1")
            .send()
            .await
            .map_err(|e| PlaybackError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::RANGE_NOT_SATISFIABLE {
            Ok(())
        } else {
            Err(PlaybackError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

#[derive(Debug, Default)]
pub struct ClockBackend {
    probe: HttpProbe,
    url: Option<String>,
    duration: Option<f64>,
    speed: f32,
    /// Position at the last play/seek/speed change
    base_position: f64,
    /// Set while playing
    started: Option<Instant>,
}

impl ClockBackend {
    pub fn new(http: Option<Client>) -> Self {
        Self {
            probe: HttpProbe::new(http),
            speed: 1.0,
            ..Default::default()
        }
    }

    /// Fold elapsed time into `base_position`
    fn settle(&mut self) {
        if self.started.is_some() {
            self.base_position = self.position();
            self.started = Some(Instant::now());
        }
    }
}

impl MediaBackend for ClockBackend {
    fn probe(&self) -> Arc<dyn StreamProbe> {
        Arc::new(self.probe.clone())
    }

    fn load(&mut self, url: &str, duration: Option<f64>) -> Result<(), PlaybackError> {
        self.stop();
        if url.is_empty() {
            return Err(PlaybackError::EmptyUrl);
        }
        tracing::debug!("Loaded stream {}", url);
        self.url = Some(url.to_string());
        self.duration = duration;
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.url.is_none() {
            return Err(PlaybackError::EmptyUrl);
        }
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.settle();
        self.started = None;
    }

    fn stop(&mut self) {
        self.url = None;
        self.duration = None;
        self.base_position = 0.0;
        self.started = None;
    }

    fn seek(&mut self, position: f64) {
        let max = self.duration.unwrap_or(f64::INFINITY);
        self.base_position = position.clamp(0.0, max);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn set_speed(&mut self, speed: f32) {
        self.settle();
        self.speed = speed;
    }

    fn position(&self) -> f64 {
        let elapsed = self
            .started
            .map(|t| t.elapsed().as_secs_f64() * self.speed as f64)
            .unwrap_or(0.0);
        let position = self.base_position + elapsed;
        match self.duration {
            Some(d) => position.min(d),
            None => position,
        }
    }

    fn is_ended(&self) -> bool {
        self.url.is_some() && self.duration.is_some_and(|d| self.position() >= d)
    }

    fn status(&self) -> PlaybackStatus {
        match (&self.url, self.started) {
            (None, _) => PlaybackStatus::Stopped,
            (Some(_), Some(_)) => PlaybackStatus::Playing,
            (Some(_), None) => PlaybackStatus::Paused,
        }
    }
}
