//! Shareable link parsing
//!
//! Turns what a user pastes into the player (bare ids, music service share
//! links, direct media URLs) into a typed reference.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ResolutionError;

lazy_static! {
    static ref SONG_LINK: Regex = Regex::new(r"(?:song\?(?:[^#]*&)?id=|/song/)(\d+)").unwrap();
    static ref PLAYLIST_LINK: Regex =
        Regex::new(r"(?:playlist\?(?:[^#]*&)?id=|/playlist/)(\d+)").unwrap();
}

/// What a track reference points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackRef {
    /// Song id on the music service
    Source(u64),
    /// A directly playable media URL
    Direct(String),
}

fn bare_id(input: &str) -> Option<u64> {
    if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
        input.parse().ok()
    } else {
        None
    }
}

fn is_http(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Parse a song id, song link or direct media URL
pub fn parse_track_ref(input: &str) -> Result<TrackRef, ResolutionError> {
    let input = input.trim();
    if let Some(id) = bare_id(input) {
        return Ok(TrackRef::Source(id));
    }
    if let Some(id) = SONG_LINK
        .captures(input)
        .and_then(|caps| caps[1].parse().ok())
    {
        return Ok(TrackRef::Source(id));
    }
    if is_http(input) && !PLAYLIST_LINK.is_match(input) {
        return Ok(TrackRef::Direct(input.to_string()));
    }
    Err(ResolutionError::InvalidReference(input.to_string()))
}

/// Parse a playlist id or playlist link
pub fn parse_playlist_ref(input: &str) -> Result<u64, ResolutionError> {
    let input = input.trim();
    bare_id(input)
        .or_else(|| {
            PLAYLIST_LINK
                .captures(input)
                .and_then(|caps| caps[1].parse().ok())
        })
        .ok_or_else(|| ResolutionError::InvalidReference(input.to_string()))
}

/// Best-effort title for a direct media URL: the decoded file stem
pub fn title_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path);
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    };
    let stem = stem.replace("%20", " ").replace('_', " ");
    if stem.is_empty() {
        url.to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_refs() {
        assert_eq!(parse_track_ref("186016"), Ok(TrackRef::Source(186016)));
        assert_eq!(
            parse_track_ref("https://music.163.com/#/song?id=1901371647"),
            Ok(TrackRef::Source(1901371647))
        );
        assert_eq!(
            parse_track_ref("https://music.163.com/song?userid=9&id=33894312&from=share"),
            Ok(TrackRef::Source(33894312))
        );
        assert_eq!(
            parse_track_ref("https://y.music.163.com/m/song/5257138/"),
            Ok(TrackRef::Source(5257138))
        );
    }

    #[test]
    fn test_direct_and_invalid() {
        assert_eq!(
            parse_track_ref(" https://cdn.example.com/a/My_Song.mp3?sig=1 "),
            Ok(TrackRef::Direct("https://cdn.example.com/a/My_Song.mp3?sig=1".into()))
        );
        assert!(parse_track_ref("not a link").is_err());
        assert!(parse_track_ref("https://music.163.com/#/playlist?id=1").is_err());
    }

    #[test]
    fn test_playlist_refs() {
        assert_eq!(parse_playlist_ref("3778678"), Ok(3778678));
        assert_eq!(
            parse_playlist_ref("https://music.163.com/#/playlist?id=19723756&userid=1"),
            Ok(19723756)
        );
        assert_eq!(parse_playlist_ref("https://music.163.com/m/playlist/42"), Ok(42));
        assert!(parse_playlist_ref("https://music.163.com/#/song?id=1").is_err());
    }

    #[test]
    fn test_title_from_url() {
        assert_eq!(title_from_url("https://cdn.example.com/a/My_Song.mp3?sig=1"), "My Song");
        assert_eq!(title_from_url("https://cdn.example.com/stream/"), "stream");
    }
}
