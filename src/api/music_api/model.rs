//! Music API model types
//!
//! Data structures for API responses. Status codes are checked by the
//! request layer; these functions only pick fields out of a success body.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

trait DeVal<'a>: Sized {
    fn dval(v: &'a Value) -> Result<Self>;
}

impl<'a> DeVal<'a> for u64 {
    fn dval(v: &Value) -> Result<Self> {
        Ok(Self::deserialize(v)?)
    }
}

impl<'a> DeVal<'a> for u32 {
    fn dval(v: &Value) -> Result<Self> {
        Ok(Self::deserialize(v)?)
    }
}

impl<'a> DeVal<'a> for String {
    fn dval(v: &Value) -> Result<Self> {
        Ok(Self::deserialize(v)?)
    }
}

impl<'a> DeVal<'a> for &'a Vec<Value> {
    fn dval(v: &'a Value) -> Result<Self> {
        match v {
            Value::Array(v) => Ok(v),
            _ => Err(anyhow!("json not a array")),
        }
    }
}

fn get_val_chain<'a, T>(v: &'a Value, names: &[&str]) -> Result<T>
where
    T: DeVal<'a>,
{
    let v = names.iter().try_fold(v, |v, n| {
        v.get(n)
            .ok_or_else(|| anyhow!("key '{}' not found, in chain {:?}", n, names))
    })?;
    T::dval(v)
}

macro_rules! get_val {
    (@as $t:ty, $v:expr, $($n:expr),+) => {
        get_val_chain::<$t>($v, &[$($n),+]).context(format!("at {}:{}", file!(), line!()))
    };
    ($v:expr, $($n:expr),+) => {
        get_val_chain($v, &[$($n),+]).context(format!("at {}:{}", file!(), line!()))
    };
}

/// Display metadata for one song
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct SongInfo {
    pub id: u64,
    pub name: String,
    /// Artist names joined with " / "
    pub singer: String,
    pub album: String,
    pub pic_url: String,
    /// Duration in milliseconds, 0 when unknown
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SongUrl {
    pub id: u64,
    pub url: String,
    pub rate: u32,
}

/// Playlist header plus the songs it lists
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct PlayListDetail {
    pub id: u64,
    pub name: String,
    /// Entries in playlist order; ids beyond `tracks` become id-only stubs
    pub songs: Vec<SongInfo>,
}

fn parse_song(v: &Value) -> Result<SongInfo> {
    let singer = get_val!(@as &Vec<Value>, v, "ar")
        .or_else(|_| get_val!(@as &Vec<Value>, v, "artists"))
        .map(|artists| {
            artists
                .iter()
                .filter_map(|a| get_val!(@as String, a, "name").ok())
                .collect::<Vec<_>>()
                .join(" / ")
        })
        .unwrap_or_default();

    Ok(SongInfo {
        id: get_val!(v, "id")?,
        name: get_val!(v, "name")?,
        singer,
        album: get_val!(v, "al", "name")
            .or_else(|_| get_val!(v, "album", "name"))
            .unwrap_or_default(),
        pic_url: get_val!(v, "al", "picUrl")
            .or_else(|_| get_val!(v, "album", "picUrl"))
            .unwrap_or_default(),
        duration: get_val!(v, "dt")
            .or_else(|_| get_val!(v, "duration"))
            .unwrap_or(0),
    })
}

pub fn to_song_info(value: &Value) -> Result<Vec<SongInfo>> {
    let array: &Vec<Value> = get_val!(value, "songs")?;
    array.iter().map(parse_song).collect()
}

/// Entries without a url are dropped: the song is unavailable at that level
pub fn to_song_url(value: &Value) -> Result<Vec<SongUrl>> {
    let array: &Vec<Value> = get_val!(value, "data")?;
    let mut vec = Vec::new();
    for v in array.iter() {
        let url: String = get_val!(v, "url").unwrap_or_default();
        if !url.is_empty() {
            vec.push(SongUrl {
                id: get_val!(v, "id")?,
                url,
                rate: get_val!(v, "br").unwrap_or(0),
            });
        }
    }
    Ok(vec)
}

/// Raw LRC text, `None` for instrumentals or songs without lyrics
pub fn to_lyric(value: &Value) -> Result<Option<String>> {
    let lrc: String = get_val!(value, "lrc", "lyric").unwrap_or_default();
    Ok(if lrc.trim().is_empty() { None } else { Some(lrc) })
}

pub fn to_playlist_detail(value: &Value) -> Result<PlayListDetail> {
    let list = vec![];
    let tracks: &Vec<Value> = get_val!(value, "playlist", "tracks").unwrap_or(&list);
    let mut songs = tracks.iter().map(parse_song).collect::<Result<Vec<_>>>()?;

    // Large playlists only embed the first page of tracks
    let track_ids: &Vec<Value> = get_val!(value, "playlist", "trackIds").unwrap_or(&list);
    let known: std::collections::HashSet<u64> = songs.iter().map(|s| s.id).collect();
    songs.extend(
        track_ids
            .iter()
            .filter_map(|t| get_val!(@as u64, t, "id").ok())
            .filter(|id| !known.contains(id))
            .map(|id| SongInfo {
                id,
                ..Default::default()
            }),
    );

    Ok(PlayListDetail {
        id: get_val!(value, "playlist", "id")?,
        name: get_val!(value, "playlist", "name").unwrap_or_default(),
        songs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_song_info() {
        let value = json!({
            "code": 200,
            "songs": [{
                "id": 186016, "name": "晴天",
                "ar": [{"name": "周杰伦"}, {"name": "Guest"}],
                "al": {"name": "叶惠美", "picUrl": "http://p/1.jpg"},
                "dt": 269000
            }]
        });
        let songs = to_song_info(&value).unwrap();
        assert_eq!(songs[0].singer, "周杰伦 / Guest");
        assert_eq!(songs[0].album, "叶惠美");
        assert_eq!(songs[0].duration, 269000);
    }

    #[test]
    fn test_song_info_missing_name_is_error() {
        let value = json!({"code": 200, "songs": [{"id": 1}]});
        assert!(to_song_info(&value).is_err());
    }

    #[test]
    fn test_song_url_skips_empty() {
        let value = json!({"code": 200, "data": [
            {"id": 1, "url": null, "br": 0},
            {"id": 2, "url": "http://m/2.mp3", "br": 320000}
        ]});
        let urls = to_song_url(&value).unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].id, 2);
    }

    #[test]
    fn test_lyric() {
        assert_eq!(
            to_lyric(&json!({"code": 200, "lrc": {"lyric": "[00:01.00]a"}})).unwrap(),
            Some("[00:01.00]a".to_string())
        );
        assert_eq!(to_lyric(&json!({"code": 200, "nolyric": true})).unwrap(), None);
    }

    #[test]
    fn test_playlist_detail_merges_track_ids() {
        let value = json!({"code": 200, "playlist": {
            "id": 9, "name": "Mix",
            "tracks": [{"id": 1, "name": "one", "ar": [{"name": "x"}]}],
            "trackIds": [{"id": 1}, {"id": 2}, {"id": 3}]
        }});
        let detail = to_playlist_detail(&value).unwrap();
        assert_eq!(detail.name, "Mix");
        assert_eq!(
            detail.songs.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(detail.songs[2].name.is_empty());
    }
}
