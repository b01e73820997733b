//! Player settings persistence
//!
//! Handles saving and loading user preferences.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Player configuration, persisted as `cfg` in the widget state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Stream quality requested from the music API
    pub quality: MusicQuality,
    /// Music API endpoint settings
    pub api: ApiSettings,
    /// Network settings
    pub network: NetworkSettings,
    /// Playlist import behaviour
    pub import: ImportSettings,
    /// Playback settings
    pub playback: PlaybackSettings,
    /// Display and interface settings
    pub display: DisplaySettings,
    /// Host settings store; local storage is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<HostSettings>,
}

/// Music quality options for streaming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MusicQuality {
    /// Standard quality (128kbps)
    Standard,
    /// Higher quality (192kbps)
    Higher,
    /// High quality (320kbps) - default
    #[default]
    High,
    /// Lossless quality (SQ/FLAC)
    Lossless,
    /// Hi-Res quality
    HiRes,
}

impl MusicQuality {
    /// Level name understood by the `song/url` endpoint
    pub fn level(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Higher => "higher",
            Self::High => "exhigh",
            Self::Lossless => "lossless",
            Self::HiRes => "hires",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Standard => "128kbps",
            Self::Higher => "192kbps",
            Self::High => "320kbps",
            Self::Lossless => "SQ",
            Self::HiRes => "Hi-Res",
        }
    }
}

impl std::str::FromStr for MusicQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" | "128" => Ok(Self::Standard),
            "higher" | "192" => Ok(Self::Higher),
            "high" | "exhigh" | "320" => Ok(Self::High),
            "lossless" | "sq" => Ok(Self::Lossless),
            "hires" | "hi_res" | "hi-res" => Ok(Self::HiRes),
            other => Err(format!("unknown quality '{}'", other)),
        }
    }
}

/// Music API endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL; endpoint paths are appended to it
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Proxy type for network settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProxyType {
    /// No proxy
    #[default]
    None,
    Http,
    Https,
    Socks5,
    /// Use system proxy settings
    System,
}

/// Network settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NetworkSettings {
    pub proxy_type: ProxyType,
    pub proxy_host: String,
    pub proxy_port: u16,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,
}

impl NetworkSettings {
    /// Build proxy URL string from settings
    /// Returns None if proxy is disabled or incomplete
    pub fn proxy_url(&self) -> Option<String> {
        let scheme = match self.proxy_type {
            ProxyType::None => return None,
            ProxyType::System => {
                return std::env::var("HTTP_PROXY")
                    .or_else(|_| std::env::var("http_proxy"))
                    .or_else(|_| std::env::var("HTTPS_PROXY"))
                    .or_else(|_| std::env::var("https_proxy"))
                    .ok();
            }
            ProxyType::Http => "http",
            ProxyType::Https => "https",
            ProxyType::Socks5 => "socks5",
        };

        if self.proxy_host.is_empty() || self.proxy_port == 0 {
            return None;
        }

        let auth = match (&self.proxy_username, &self.proxy_password) {
            (Some(user), Some(pass)) if !user.is_empty() => format!("{}:{}@", user, pass),
            (Some(user), None) if !user.is_empty() => format!("{}@", user),
            _ => String::new(),
        };

        Some(format!(
            "{}://{}{}:{}",
            scheme, auth, self.proxy_host, self.proxy_port
        ))
    }
}

/// Playlist import behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Pause between per-track lookups during bulk operations
    pub delay_ms: u64,
    /// How many import records to keep
    pub history_limit: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            delay_ms: 300,
            history_limit: 20,
        }
    }
}

/// Playback-related settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Speed applied to a fresh session
    pub default_speed: f32,
    /// Start playing the first imported track when the playlist was empty
    pub auto_play_on_import: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            default_speed: 1.0,
            auto_play_on_import: false,
        }
    }
}

/// Display and interface settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub dark_mode: bool,
    pub show_lyrics: bool,
    /// Widget opacity (0.2 to 1.0)
    pub opacity: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            show_lyrics: true,
            opacity: 0.95,
        }
    }
}

/// Host-provided settings object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// JSON file holding the host's settings object
    pub settings_path: PathBuf,
    /// Key of this extension inside the host's settings object
    pub extension_name: String,
    /// Delay before a requested save is written
    pub debounce_ms: u64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from("settings.json"),
            extension_name: "musicdock".to_string(),
            debounce_ms: 500,
        }
    }
}

/// Play mode for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Play in order, stop at end
    #[default]
    Sequential,
    /// Play in order, loop back to start
    LoopAll,
    /// Random order, never repeating the current track when avoidable
    Shuffle,
}

impl std::fmt::Display for PlayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for PlayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" | "seq" => Ok(Self::Sequential),
            "loop" | "loop_all" | "loop-all" => Ok(Self::LoopAll),
            "shuffle" | "random" => Ok(Self::Shuffle),
            other => Err(format!("unknown play mode '{}'", other)),
        }
    }
}

impl PlayMode {
    /// Get the next play mode in cycle order
    pub fn next(self) -> Self {
        match self {
            PlayMode::Sequential => PlayMode::LoopAll,
            PlayMode::LoopAll => PlayMode::Shuffle,
            PlayMode::Shuffle => PlayMode::Sequential,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlayMode::Sequential => "Sequential",
            PlayMode::LoopAll => "Loop all",
            PlayMode::Shuffle => "Shuffle",
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "musicdock", "MusicDock")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save settings to a specific file
    pub fn save_to_file(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
