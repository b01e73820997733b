//! Interactive commands
//!
//! Each input line is split shell-style and parsed with clap. Track
//! positions are 1-based as shown in the playlist.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::features::settings::MusicQuality;
use crate::features::{Panel, PlayMode};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Add a song by id, share link or direct media URL
    Add { reference: String },
    /// Import every song of a playlist by id or share link
    Import { reference: String },
    /// Play the track at a position
    Play { position: usize },
    Pause,
    Resume,
    /// Pause or resume
    Toggle,
    Next,
    Prev,
    /// Remove the track at a position
    Delete { position: usize },
    /// Move a track to another position
    Move { from: usize, to: usize },
    /// Remove every track (asks first)
    Clear,
    /// Edit a track title
    Rename { position: usize },
    /// Set the play mode, or cycle it when omitted
    Mode { mode: Option<PlayMode> },
    /// Playback speed, 0.5 to 2.0
    Speed { value: f32 },
    /// Jump to a position in seconds
    Seek { seconds: f64 },
    /// Stream quality for songs resolved from now on
    Quality { level: MusicQuality },
    Lyrics {
        #[command(subcommand)]
        action: LyricsAction,
    },
    /// Toggle a panel: playlist, lyrics or settings
    Panel { panel: Panel },
    /// Open a panel if it is closed
    Show { panel: Panel },
    /// Close every panel
    Hide,
    /// Shrink the player to its transport line, or expand it
    Collapse,
    /// Drag the player widget to a point
    Drag { x: f32, y: f32 },
    /// The host window changed size
    Viewport { width: f32, height: f32 },
    /// Re-resolve stream URLs for every external track
    Refresh,
    /// Show the playlist
    List,
    Quit,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum LyricsAction {
    /// Attach an LRC file to a track
    Load { position: usize, path: PathBuf },
    /// Remove lyrics from a track
    Clear { position: usize },
    /// Move all lines of the current track by an offset in seconds
    Shift {
        #[arg(allow_negative_numbers = true)]
        seconds: f64,
    },
    /// Print the lyrics of the current track
    Show,
}

/// Split on whitespace, keeping double-quoted runs together
pub fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        args.push(current);
    }
    args
}

/// Parse one input line; `Ok(None)` for a blank line
pub fn parse(line: &str) -> Result<Option<Command>, clap::Error> {
    let args = split_args(line);
    if args.is_empty() {
        return Ok(None);
    }
    CommandLine::try_parse_from(args).map(|cl| Some(cl.command))
}

/// Playlist index for a 1-based position
pub fn to_index(position: usize) -> Option<usize> {
    position.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("  add   123 "), vec!["add", "123"]);
        assert_eq!(
            split_args(r#"lyrics load 2 "/tmp/my song.lrc""#),
            vec!["lyrics", "load", "2", "/tmp/my song.lrc"]
        );
        assert_eq!(split_args(r#"x """#), vec!["x", ""]);
        assert!(split_args("   ").is_empty());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("play 3").unwrap(), Some(Command::Play { position: 3 }));
        assert_eq!(parse("mode").unwrap(), Some(Command::Mode { mode: None }));
        assert_eq!(
            parse("mode shuffle").unwrap(),
            Some(Command::Mode {
                mode: Some(PlayMode::Shuffle)
            })
        );
        assert_eq!(
            parse("panel lyrics").unwrap(),
            Some(Command::Panel { panel: Panel::Lyrics })
        );
        assert_eq!(
            parse("lyrics shift -0.5").unwrap(),
            Some(Command::Lyrics {
                action: LyricsAction::Shift { seconds: -0.5 }
            })
        );
        assert_eq!(
            parse("quality lossless").unwrap(),
            Some(Command::Quality {
                level: MusicQuality::Lossless
            })
        );
        assert_eq!(
            parse("viewport 640 480").unwrap(),
            Some(Command::Viewport {
                width: 640.0,
                height: 480.0
            })
        );
        assert_eq!(parse("").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("play").is_err());
        assert!(parse("speed fast").is_err());
        assert!(parse("dance").is_err());
    }

    #[test]
    fn test_to_index() {
        assert_eq!(to_index(1), Some(0));
        assert_eq!(to_index(0), None);
    }
}
