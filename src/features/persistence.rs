//! Saved widget state
//!
//! `PersistedState` is the JSON document written after every change. It is
//! kept either in a local file (`LocalStore`) or under this extension's key
//! inside the host's settings object (`HostSettingsStore`), whose writes are
//! debounced.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lyrics::LyricLine;
use super::player::PlayerController;
use super::playlist::Track;
use super::resolver::ImportSummary;
use super::settings::{HostSettings, PlayMode, Settings};
use super::widget::{Position, WidgetLayout};
use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub playlist: Vec<Track>,
    pub state: SavedState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavedState {
    #[serde(with = "index")]
    pub current_index: Option<usize>,
    pub play_mode: PlayMode,
    pub is_playing: bool,
    pub playback_speed: f32,
    /// Parsed lines of the current track
    pub lyrics: Vec<LyricLine>,
    #[serde(with = "index")]
    pub current_lyric_index: Option<usize>,
    pub cfg: Settings,
    pub import_history: Vec<ImportRecord>,
    pub positions: BTreeMap<String, Position>,
}

impl Default for SavedState {
    fn default() -> Self {
        Self {
            current_index: None,
            play_mode: PlayMode::default(),
            is_playing: false,
            playback_speed: 1.0,
            lyrics: Vec::new(),
            current_lyric_index: None,
            cfg: Settings::default(),
            import_history: Vec::new(),
            positions: BTreeMap::new(),
        }
    }
}

/// Optional index stored as -1 for none
mod index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(i) => s.serialize_i64(*i as i64),
            None => s.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        let raw = Option::<i64>::deserialize(d)?;
        Ok(raw.filter(|&i| i >= 0).map(|i| i as usize))
    }
}

/// One finished playlist import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub playlist_id: u64,
    pub name: String,
    pub imported: usize,
    pub failed: usize,
    pub skipped: usize,
    pub at: DateTime<Utc>,
}

impl ImportRecord {
    pub fn from_summary(summary: &ImportSummary) -> Self {
        Self {
            playlist_id: summary.playlist_id,
            name: summary.name.clone(),
            imported: summary.success_count,
            failed: summary.fail_count,
            skipped: summary.skipped_duplicates,
            at: Utc::now(),
        }
    }
}

/// Newest first, at most `limit` entries
pub fn record_import(history: &mut Vec<ImportRecord>, record: ImportRecord, limit: usize) {
    history.insert(0, record);
    history.truncate(limit);
}

impl PersistedState {
    pub fn capture(
        player: &PlayerController,
        settings: &Settings,
        history: &[ImportRecord],
        layout: &WidgetLayout,
    ) -> Self {
        let playlist = player.playlist();
        Self {
            playlist: playlist.tracks().to_vec(),
            state: SavedState {
                current_index: playlist.current_index(),
                play_mode: playlist.play_mode,
                is_playing: player.is_playing(),
                playback_speed: player.speed(),
                lyrics: player.lyrics().lines().to_vec(),
                current_lyric_index: player.lyrics().index(),
                cfg: settings.clone(),
                import_history: history.to_vec(),
                positions: layout.positions().clone(),
            },
        }
    }
}

pub trait StateStore: Send {
    /// `Ok(None)` when nothing was saved yet
    fn load(&self) -> Result<Option<PersistedState>, StoreError>;

    fn save(&mut self, state: &PersistedState) -> Result<(), StoreError>;

    /// Write anything still pending
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn describe(&self) -> String;
}

/// Host store when configured, local file otherwise
pub fn open_store(
    host: Option<&HostSettings>,
    state_file: Option<PathBuf>,
) -> Result<Box<dyn StateStore>, StoreError> {
    if let Some(host) = host {
        return Ok(Box::new(HostSettingsStore::new(host)));
    }
    let path = match state_file {
        Some(path) => path,
        None => LocalStore::default_path()?,
    };
    Ok(Box::new(LocalStore::new(path)))
}

fn read_json(path: &Path) -> Result<Option<Value>, StoreError> {
    match std::fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(None),
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write through a temporary file so a crash never leaves half a document
fn write_json(path: &Path, value: &impl Serialize) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

// ============ Local store ============

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> Result<PathBuf, StoreError> {
        directories::ProjectDirs::from("com", "musicdock", "MusicDock")
            .map(|dirs| dirs.data_dir().join("state.json"))
            .ok_or(StoreError::NoDataDir)
    }
}

impl StateStore for LocalStore {
    fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        match read_json(&self.path)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), StoreError> {
        write_json(&self.path, state)?;
        tracing::debug!("Saved state to {:?}", self.path);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("local file {}", self.path.display())
    }
}

// ============ Host settings store ============

#[derive(Debug)]
struct HostShared {
    path: PathBuf,
    key: String,
    pending: Mutex<Option<Value>>,
    generation: AtomicU64,
}

impl HostShared {
    /// Merge the pending value into the host object under our key
    fn write_pending(&self) -> Result<(), StoreError> {
        let Some(value) = self.pending.lock().take() else {
            return Ok(());
        };
        let mut root = match read_json(&self.path)? {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        root.insert(self.key.clone(), value);
        write_json(&self.path, &Value::Object(root))?;
        tracing::debug!("Wrote host settings key {} to {:?}", self.key, self.path);
        Ok(())
    }
}

/// State stored under one key of the host's settings object.
///
/// Saves are coalesced: only the last state requested within the debounce
/// window is written. Must be used inside a tokio runtime.
#[derive(Debug)]
pub struct HostSettingsStore {
    shared: Arc<HostShared>,
    debounce: Duration,
}

impl HostSettingsStore {
    pub fn new(host: &HostSettings) -> Self {
        Self {
            shared: Arc::new(HostShared {
                path: host.settings_path.clone(),
                key: host.extension_name.clone(),
                pending: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
            debounce: Duration::from_millis(host.debounce_ms),
        }
    }
}

impl StateStore for HostSettingsStore {
    fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        let Some(root) = read_json(&self.shared.path)? else {
            return Ok(None);
        };
        match root.get(&self.shared.key) {
            Some(value) if !value.is_null() => Ok(Some(serde_json::from_value(value.clone())?)),
            _ => Ok(None),
        }
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), StoreError> {
        *self.shared.pending.lock() = Some(serde_json::to_value(state)?);
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Arc::clone(&self.shared);
        let debounce = self.debounce;

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if shared.generation.load(Ordering::SeqCst) != generation {
                // A newer save owns the write
                return;
            }
            if let Err(e) = shared.write_pending() {
                tracing::error!("Failed to write host settings: {}", e);
            }
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.write_pending()
    }

    fn describe(&self) -> String {
        format!(
            "host settings {} [{}]",
            self.shared.path.display(),
            self.shared.key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> PersistedState {
        let mut track = Track::new("Song", "Singer", "http://m/1.mp3");
        track.source_id = Some(9);
        PersistedState {
            playlist: vec![track],
            state: SavedState {
                current_index: Some(0),
                play_mode: PlayMode::Shuffle,
                playback_speed: 1.25,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(PersistedState::default()).unwrap();
        assert_eq!(value["state"]["currentIndex"], -1);
        assert_eq!(value["state"]["currentLyricIndex"], -1);
        assert_eq!(value["state"]["playMode"], "sequential");
        assert_eq!(value["state"]["playbackSpeed"], 1.0);
        assert!(value["state"]["importHistory"].is_array());

        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["state"]["currentIndex"], 0);
        assert_eq!(value["playlist"][0]["sourceId"], 9);
    }

    #[test]
    fn test_partial_document_defaults() {
        let state: PersistedState = serde_json::from_value(json!({
            "playlist": [{ "title": "A", "artist": "B", "url": "http://x" }],
            "state": { "currentIndex": -1, "currentLyricIndex": null }
        }))
        .unwrap();
        assert_eq!(state.state.current_index, None);
        assert_eq!(state.state.current_lyric_index, None);
        assert_eq!(state.state.playback_speed, 1.0);
        assert_eq!(state.playlist.len(), 1);
    }

    #[test]
    fn test_history_is_capped_newest_first() {
        let mut history = Vec::new();
        for id in 0..5 {
            let summary = ImportSummary {
                playlist_id: id,
                name: format!("p{}", id),
                ..Default::default()
            };
            record_import(&mut history, ImportRecord::from_summary(&summary), 3);
        }
        let ids: Vec<u64> = history.iter().map(|r| r.playlist_id).collect();
        assert_eq!(ids, vec![4, 3, 2]);
    }

    #[test]
    fn test_local_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::new(dir.path().join("nested").join("state.json"));
        assert_eq!(store.load().unwrap(), None);

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
    }

    #[test]
    fn test_local_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            LocalStore::new(path).load(),
            Err(StoreError::Parse(_))
        ));
    }

    fn host(dir: &Path) -> HostSettings {
        HostSettings {
            settings_path: dir.join("host.json"),
            extension_name: "musicdock".into(),
            debounce_ms: 500,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_host_store_debounces_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = host(dir.path());
        std::fs::write(&cfg.settings_path, r#"{"otherPlugin":{"enabled":true}}"#).unwrap();
        let mut store = HostSettingsStore::new(&cfg);

        let mut first = sample();
        first.state.playback_speed = 0.5;
        store.save(&first).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        store.save(&sample()).unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(store.load().unwrap(), None);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.load().unwrap(), Some(sample()));

        let root: Value =
            serde_json::from_str(&std::fs::read_to_string(&cfg.settings_path).unwrap()).unwrap();
        assert_eq!(root["otherPlugin"]["enabled"], true);
    }

    #[tokio::test]
    async fn test_host_store_flush_writes_now() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HostSettingsStore::new(&host(dir.path()));
        store.save(&sample()).unwrap();
        store.flush().unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
    }

    #[test]
    fn test_open_store_prefers_host() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = host(dir.path());
        let store = open_store(Some(&cfg), None).unwrap();
        assert!(store.describe().starts_with("host settings"));

        let store = open_store(None, Some(dir.path().join("s.json"))).unwrap();
        assert!(store.describe().starts_with("local file"));
    }
}
