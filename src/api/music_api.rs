//! HTTP client for the third-party music API
//!
//! Every endpoint is a POST with a JSON body carrying an identifier. The
//! response body carries a `code` field; 200 means success.

pub mod model;

pub use model::*;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;

use super::MusicSource;
use crate::error::ResolutionError;
use crate::features::settings::{ApiSettings, MusicQuality};

const USER_AGENT: &str = concat!("musicdock/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct MusicApi {
    client: Client,
    base_url: String,
}

impl fmt::Debug for MusicApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MusicApi")
            .field("client", &"<HttpClient>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl MusicApi {
    pub fn new(settings: &ApiSettings, proxy: Option<String>) -> Result<Self, ResolutionError> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(USER_AGENT);
        if let Some(url) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(&url)?);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Shared HTTP client, reused for stream probing
    pub fn http(&self) -> &Client {
        &self.client
    }

    async fn request(&self, path: &str, body: Value) -> Result<Value, ResolutionError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!("POST {} {}", url, body);

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::Status {
                code: status.as_u16() as i64,
            });
        }

        let value: Value = response.json().await?;
        check_code(&value)?;
        Ok(value)
    }
}

/// Reject bodies whose `code` is missing or not 200
fn check_code(value: &Value) -> Result<(), ResolutionError> {
    match value.get("code").and_then(Value::as_i64) {
        Some(200) => Ok(()),
        Some(code) => Err(ResolutionError::Status { code }),
        None => Err(ResolutionError::Decode("response has no code field".into())),
    }
}

fn decode<T>(result: anyhow::Result<T>) -> Result<T, ResolutionError> {
    result.map_err(|e| ResolutionError::Decode(format!("{:#}", e)))
}

#[async_trait]
impl MusicSource for MusicApi {
    async fn song_detail(&self, id: u64) -> Result<SongInfo, ResolutionError> {
        let value = self.request("song/detail", json!({ "id": id })).await?;
        decode(to_song_info(&value))?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ResolutionError::Decode(format!("song {} missing from detail", id)))
    }

    async fn song_url(&self, id: u64, quality: MusicQuality) -> Result<SongUrl, ResolutionError> {
        let value = self
            .request("song/url", json!({ "id": id, "level": quality.level() }))
            .await?;
        decode(to_song_url(&value))?
            .into_iter()
            .next()
            .ok_or(ResolutionError::NoStreamUrl(id))
    }

    async fn song_lyric(&self, id: u64) -> Result<Option<String>, ResolutionError> {
        let value = self.request("lyric", json!({ "id": id })).await?;
        decode(to_lyric(&value))
    }

    async fn playlist_detail(&self, id: u64) -> Result<PlayListDetail, ResolutionError> {
        let value = self.request("playlist/detail", json!({ "id": id })).await?;
        decode(to_playlist_detail(&value))
    }
}
