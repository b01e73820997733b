//! Startup flags

use std::path::PathBuf;

use clap::Parser;

use crate::features::Settings;
use crate::features::settings::HostSettings;

/// Floating music player widget with synced lyrics
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "musicdock", version)]
pub struct Cli {
    /// Local state file, defaults to the platform data directory
    #[arg(long, env = "MUSICDOCK_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Host settings JSON file; state is kept under the extension key
    #[arg(long, env = "MUSICDOCK_HOST_SETTINGS")]
    pub host_settings: Option<PathBuf>,

    /// Key used inside the host settings object
    #[arg(long, env = "MUSICDOCK_EXTENSION_NAME")]
    pub extension_name: Option<String>,

    /// Base URL of the music API
    #[arg(long, env = "MUSICDOCK_API_BASE")]
    pub api_base: Option<String>,

    /// Log filter, e.g. "debug" or "musicdock=trace"
    #[arg(long, env = "MUSICDOCK_LOG")]
    pub log_level: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Flags win over file and saved configuration
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.host_settings {
            let host = settings.host.get_or_insert_with(HostSettings::default);
            host.settings_path = path.clone();
        }
        if let (Some(name), Some(host)) = (&self.extension_name, settings.host.as_mut()) {
            host.extension_name = name.clone();
        }
        if let Some(base) = &self.api_base {
            settings.api.base_url = base.trim_end_matches('/').to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "musicdock",
            "--host-settings",
            "/tmp/host.json",
            "--extension-name",
            "dock",
            "--api-base",
            "http://127.0.0.1:4000/",
        ])
        .unwrap();
        let mut settings = Settings::default();
        cli.apply(&mut settings);

        let host = settings.host.unwrap();
        assert_eq!(host.settings_path, PathBuf::from("/tmp/host.json"));
        assert_eq!(host.extension_name, "dock");
        assert_eq!(host.debounce_ms, 500);
        assert_eq!(settings.api.base_url, "http://127.0.0.1:4000");
    }

    #[test]
    fn test_extension_name_alone_keeps_local_store() {
        let cli = Cli {
            extension_name: Some("dock".into()),
            ..Default::default()
        };
        let mut settings = Settings::default();
        cli.apply(&mut settings);
        assert!(settings.host.is_none());
    }
}
