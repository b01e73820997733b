//! Lyric file loading
//!
//! Many .lrc files shared around are saved in GBK, Big5 or Shift-JIS rather
//! than UTF-8, so decoding falls back through common legacy encodings.

use encoding_rs::{BIG5, GBK, SHIFT_JIS, UTF_16BE, UTF_16LE, WINDOWS_1252};
use std::path::Path;

use super::parser::{LyricLine, parse_lrc};

/// Decode lyric file bytes to text
pub fn decode_lyrics(bytes: &[u8]) -> String {
    // Byte order marks win
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return UTF_16LE.decode(bytes).0.into_owned();
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return UTF_16BE.decode(bytes).0.into_owned();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    for encoding in [GBK, BIG5, SHIFT_JIS, WINDOWS_1252] {
        let (decoded, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            tracing::debug!("Decoded lyric file as {}", encoding.name());
            return decoded.into_owned();
        }
    }

    String::from_utf8_lossy(bytes).into_owned()
}

/// Read a lyric file, returning its raw text and parsed lines
pub fn read_lyrics_file(path: &Path) -> std::io::Result<(String, Vec<LyricLine>)> {
    let bytes = std::fs::read(path)?;
    let text = decode_lyrics(&bytes);
    let lines = parse_lrc(&text);
    tracing::info!("Loaded {} lyric lines from {:?}", lines.len(), path);
    Ok((text, lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        let input = "[00:01.00]你好世界";
        assert_eq!(decode_lyrics(input.as_bytes()), input);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"[00:01.00]hi");
        assert_eq!(decode_lyrics(&bytes), "[00:01.00]hi");
    }

    #[test]
    fn test_gbk_decode() {
        // "[00:01.00]周杰伦" with the name in GBK
        let mut bytes = b"[00:01.00]".to_vec();
        bytes.extend_from_slice(&[0xD6, 0xDC, 0xBD, 0xDC, 0xC2, 0xD7]);
        let lines = parse_lrc(&decode_lyrics(&bytes));
        assert_eq!(lines[0].text, "周杰伦");
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.lrc");
        std::fs::write(&path, "[00:02.00]b\n[00:01.00]a").unwrap();
        let (text, lines) = read_lyrics_file(&path).unwrap();
        assert!(text.contains("[00:02.00]b"));
        assert_eq!(lines[0].text, "a");
    }
}
