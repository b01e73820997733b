//! Terminal renderer
//!
//! Maps change events onto screen regions and redraws each touched region
//! once per batch.

use std::io::{self, Write};

use crate::features::resolver::ImportProgress;
use crate::features::{
    DialogRequest, LayoutEvent, PlayerController, PlayerEvent, Settings, WidgetLayout,
};
use crate::features::widget::Panel;

use super::toast::Toast;

/// Part of the widget that can be redrawn on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Playlist,
    NowPlaying,
    Lyrics,
    LyricLine,
    Toast,
}

/// Regions touched by a batch of events, in first-touched order
pub fn regions(events: &[PlayerEvent]) -> Vec<Region> {
    let mut out = Vec::new();
    for event in events {
        let region = match event {
            PlayerEvent::PlaylistChanged => Region::Playlist,
            PlayerEvent::CurrentTrackChanged(_)
            | PlayerEvent::PlaybackChanged { .. }
            | PlayerEvent::PlayModeChanged(_)
            | PlayerEvent::SpeedChanged(_) => Region::NowPlaying,
            PlayerEvent::LyricsChanged => Region::Lyrics,
            PlayerEvent::LyricIndexChanged(_) => Region::LyricLine,
            PlayerEvent::Status(_) => Region::Toast,
        };
        if !out.contains(&region) {
            out.push(region);
        }
    }
    // A full lyric redraw already highlights the active line
    if out.contains(&Region::Lyrics) {
        out.retain(|r| *r != Region::LyricLine);
    }
    out
}

pub struct Renderer<W: Write> {
    out: W,
    ansi: bool,
    show_lyrics: bool,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, ansi: bool) -> Self {
        Self {
            out,
            ansi,
            show_lyrics: true,
        }
    }

    pub fn set_show_lyrics(&mut self, show: bool) {
        self.show_lyrics = show;
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Redraw what a batch of player events touched
    pub fn apply(&mut self, events: &[PlayerEvent], player: &PlayerController) -> io::Result<()> {
        for region in regions(events) {
            match region {
                Region::Playlist => self.draw_playlist(player)?,
                Region::NowPlaying => self.draw_now_playing(player)?,
                Region::Lyrics => self.draw_lyrics(player)?,
                Region::LyricLine => self.draw_lyric_line(player)?,
                Region::Toast => {
                    for event in events {
                        if let PlayerEvent::Status(status) = event {
                            self.draw_toast(&Toast::from(status.clone()))?;
                        }
                    }
                }
            }
        }
        self.out.flush()
    }

    pub fn draw_all(&mut self, player: &PlayerController, layout: &WidgetLayout) -> io::Result<()> {
        self.draw_now_playing(player)?;
        let panels = layout.panels();
        if panels.playlist {
            self.draw_playlist(player)?;
        }
        if panels.lyrics {
            self.draw_lyrics(player)?;
        }
        self.out.flush()
    }

    pub fn draw_now_playing(&mut self, player: &PlayerController) -> io::Result<()> {
        let playlist = player.playlist();
        let icon = if player.is_playing() {
            "▶"
        } else if player.is_loading() {
            "…"
        } else {
            "⏸"
        };
        match playlist.current() {
            Some(track) => writeln!(
                self.out,
                "{} {}  [{}] x{:.2}",
                icon,
                track.display_name(),
                playlist.play_mode,
                player.speed()
            ),
            None => writeln!(
                self.out,
                "■ Stopped  [{}] x{:.2}",
                playlist.play_mode,
                player.speed()
            ),
        }
    }

    pub fn draw_playlist(&mut self, player: &PlayerController) -> io::Result<()> {
        let playlist = player.playlist();
        if playlist.is_empty() {
            return writeln!(self.out, "  (playlist is empty)");
        }
        for (i, track) in playlist.tracks().iter().enumerate() {
            let marker = if playlist.current_index() == Some(i) { '*' } else { ' ' };
            let lyric = if track.has_lyrics() { " ♪" } else { "" };
            writeln!(self.out, "{} {:>3}. {}{}", marker, i + 1, track.display_name(), lyric)?;
        }
        Ok(())
    }

    pub fn draw_lyrics(&mut self, player: &PlayerController) -> io::Result<()> {
        if !self.show_lyrics {
            return Ok(());
        }
        let cursor = player.lyrics();
        if cursor.lines().is_empty() {
            return Ok(());
        }
        for (i, line) in cursor.lines().iter().enumerate() {
            let marker = if cursor.index() == Some(i) { '>' } else { ' ' };
            writeln!(
                self.out,
                "{} [{}] {}",
                marker,
                crate::features::lyrics::format_timestamp(line.time),
                line.text
            )?;
        }
        Ok(())
    }

    pub fn draw_lyric_line(&mut self, player: &PlayerController) -> io::Result<()> {
        if !self.show_lyrics {
            return Ok(());
        }
        match player.lyrics().current_line() {
            Some(line) => writeln!(self.out, "♪ {}", line.text),
            None => Ok(()),
        }
    }

    /// Raw text such as command help
    pub fn print(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text.trim_end())?;
        self.out.flush()
    }

    pub fn draw_settings(&mut self, settings: &Settings) -> io::Result<()> {
        writeln!(self.out, "  Quality:   {}", settings.quality.display_name())?;
        writeln!(self.out, "  API:       {}", settings.api.base_url)?;
        writeln!(self.out, "  Import:    {} ms between songs", settings.import.delay_ms)?;
        writeln!(self.out, "  Speed:     x{:.2} default", settings.playback.default_speed)?;
        match &settings.host {
            Some(host) => writeln!(
                self.out,
                "  Storage:   host settings {} [{}]",
                host.settings_path.display(),
                host.extension_name
            ),
            None => writeln!(self.out, "  Storage:   local"),
        }
    }

    pub fn draw_toast(&mut self, toast: &Toast) -> io::Result<()> {
        writeln!(self.out, "{}", toast.line(self.ansi))
    }

    /// Transport line plus the toast still showing under it
    pub fn draw_transport(&mut self, player: &PlayerController, toast: Option<&Toast>) -> io::Result<()> {
        self.draw_now_playing(player)?;
        if let Some(toast) = toast {
            self.draw_toast(toast)?;
        }
        self.out.flush()
    }

    pub fn apply_layout(
        &mut self,
        events: &[LayoutEvent],
        player: &PlayerController,
        settings: &Settings,
    ) -> io::Result<()> {
        for event in events {
            match event {
                LayoutEvent::PanelChanged { panel, open } => {
                    writeln!(
                        self.out,
                        "[{} {}]",
                        panel.display_name(),
                        if *open { "opened" } else { "closed" }
                    )?;
                    if *open {
                        match panel {
                            Panel::Playlist => self.draw_playlist(player)?,
                            Panel::Lyrics => self.draw_lyrics(player)?,
                            Panel::Settings => self.draw_settings(settings)?,
                        }
                    }
                }
                LayoutEvent::Moved { .. } => {}
                LayoutEvent::Collapsed(true) => writeln!(self.out, "[player collapsed]")?,
                LayoutEvent::Collapsed(false) => {
                    writeln!(self.out, "[player expanded]")?;
                    self.draw_now_playing(player)?;
                }
                LayoutEvent::DragEnded { id, position } => {
                    writeln!(self.out, "[{} at {:.0},{:.0}]", id, position.x, position.y)?;
                }
            }
        }
        self.out.flush()
    }

    pub fn draw_dialog(&mut self, request: &DialogRequest) -> io::Result<()> {
        match request {
            DialogRequest::Confirm { message, .. } => write!(self.out, "{} [y/N] ", message)?,
            DialogRequest::Prompt {
                message, default, ..
            } => write!(self.out, "{} [{}] ", message, default)?,
        }
        self.out.flush()
    }

    pub fn draw_progress(&mut self, progress: &ImportProgress) -> io::Result<()> {
        match progress {
            ImportProgress::Started { name, total } => {
                writeln!(self.out, "Importing {} ({} songs)", name, total)
            }
            ImportProgress::Resolved {
                current,
                total,
                title,
            } => writeln!(self.out, "  [{}/{}] {}", current, total, title),
            ImportProgress::Failed {
                current,
                total,
                id,
                error,
            } => writeln!(self.out, "  [{}/{}] {} failed: {}", current, total, id, error),
            ImportProgress::Skipped { current, total, id } => {
                writeln!(self.out, "  [{}/{}] {} already in playlist", current, total, id)
            }
        }
    }
}
