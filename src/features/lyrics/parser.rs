//! Standard LRC format parser
//!
//! Supports the common [mm:ss.xx]text format with line-level synchronization.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::error::ParseError;

lazy_static! {
    /// One leading `[mm:ss.xx]` or `[mm:ss.xxx]` tag
    static ref TIMESTAMP: Regex = Regex::new(r"^\[(\d+):(\d{2})\.(\d{2,3})\]").unwrap();
}

/// A single timed line of lyrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Start time in seconds
    pub time: f64,
    pub text: String,
}

impl LyricLine {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

/// Parse one leading timestamp, returning bytes consumed and seconds
fn parse_time(src: &str) -> Option<(usize, f64)> {
    let caps = TIMESTAMP.captures(src)?;
    let min: u64 = caps[1].parse().ok()?;
    let sec: u64 = caps[2].parse().ok()?;
    let frac_str = &caps[3];
    let frac: u64 = frac_str.parse().ok()?;

    // xx is hundredths, xxx is thousandths
    let frac_ms = match frac_str.len() {
        2 => frac * 10,
        _ => frac,
    };

    // Absurd minute counts overflow; such a tag is not a timestamp
    let time_ms = min
        .checked_mul(60)?
        .checked_add(sec)?
        .checked_mul(1000)?
        .checked_add(frac_ms)?;
    Some((caps[0].len(), time_ms as f64 / 1000.0))
}

/// Parse a single LRC line, which may have multiple timestamps
///
/// Returns `Err` when the line carries no timestamp at all (metadata tags,
/// plain text). A timed line with blank text yields an empty vec.
fn parse_line(line: &str) -> Result<Vec<LyricLine>, ParseError> {
    let line = line.trim();
    let mut timestamps = Vec::new();
    let mut pos = 0;

    while let Some((consumed, time)) = parse_time(&line[pos..]) {
        timestamps.push(time);
        pos += consumed;
    }

    if timestamps.is_empty() {
        return Err(ParseError(line.to_string()));
    }

    let text = line[pos..].trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    Ok(timestamps
        .into_iter()
        .map(|time| LyricLine::new(time, text))
        .collect())
}

/// Parse LRC content into lyric lines sorted by start time
pub fn parse_lrc(src: &str) -> Vec<LyricLine> {
    let mut result = Vec::new();

    for line in src.lines() {
        match parse_line(line) {
            Ok(parsed) => result.extend(parsed),
            Err(ParseError(_)) => continue,
        }
    }

    // Stable: equal timestamps keep their source order
    result.sort_by(|a, b| a.time.total_cmp(&b.time));
    result
}

/// Format seconds as `mm:ss.xx`, or `mm:ss.xxx` when milliseconds matter
pub fn format_timestamp(seconds: f64) -> String {
    let millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let (min, sec) = (millis / 60_000, (millis / 1000) % 60);
    if millis % 10 == 0 {
        format!("{:02}:{:02}.{:02}", min, sec, (millis % 1000) / 10)
    } else {
        format!("{:02}:{:02}.{:03}", min, sec, millis % 1000)
    }
}

/// Convert lyrics back to LRC text
pub fn to_lrc(lines: &[LyricLine]) -> String {
    let capacity: usize = lines.iter().map(|l| l.text.len() + 11).sum();
    let mut result = String::with_capacity(capacity);

    for line in lines {
        let _ = writeln!(result, "[{}]{}", format_timestamp(line.time), line.text);
    }

    result
}

/// Offset every line by `offset` seconds, clamping at zero
pub fn shift(lines: &[LyricLine], offset: f64) -> Vec<LyricLine> {
    lines
        .iter()
        .map(|l| LyricLine::new((l.time + offset).max(0.0), l.text.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("[00:01.12]"), Some((10, 1.12)));
        assert_eq!(parse_time("[00:10.254]"), Some((11, 10.254)));
        assert_eq!(parse_time("[01:10.50]"), Some((10, 70.5)));
        assert_eq!(parse_time("[00:00.00]"), Some((10, 0.0)));
        assert_eq!(parse_time("[00:01.1]"), None);
        assert_eq!(parse_time("[ti:Song]"), None);
    }

    #[test]
    fn test_huge_minutes_dropped() {
        let lines = parse_lrc("[307445734561825861:00.00]boom\n[00:01.00]ok");
        assert_eq!(lines, vec![LyricLine::new(1.0, "ok")]);
        assert_eq!(parse_time("[99999999999999999999:00.00]"), None);
    }

    #[test]
    fn test_parse_out_of_order() {
        let lines = parse_lrc("[00:01.50]hello\n[00:00.00]world");
        assert_eq!(
            lines,
            vec![LyricLine::new(0.0, "world"), LyricLine::new(1.5, "hello")]
        );
    }

    #[test]
    fn test_parse_multiple_timestamps() {
        let lines = parse_lrc("[00:12.50][01:30.00]Repeated line\n[00:20.00]Middle");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], LyricLine::new(12.5, "Repeated line"));
        assert_eq!(lines[1].text, "Middle");
        assert_eq!(lines[2].time, 90.0);
    }

    #[test]
    fn test_drops_metadata_and_blank() {
        let content = "[ti:Test Song]\n[ar:Test Artist]\nno timestamp here\n[00:03.00]   \n[00:05.00] Second line ";
        let lines = parse_lrc(content);
        assert_eq!(lines, vec![LyricLine::new(5.0, "Second line")]);
    }

    #[test]
    fn test_parse_line_reports_unmatched() {
        assert!(parse_line("plain text").is_err());
        assert_eq!(parse_line("[00:01.00]").unwrap(), Vec::new());
    }

    #[test]
    fn test_sorted_non_decreasing() {
        let content = "[02:00.00]c\n[00:30.00]a\n[01:00.000]b\n[00:30.00]a2\n[00:00.10]z";
        let lines = parse_lrc(content);
        assert!(lines.windows(2).all(|w| w[0].time <= w[1].time));
        // equal timestamps keep source order
        assert_eq!(lines[1].text, "a");
        assert_eq!(lines[2].text, "a2");
    }

    #[test]
    fn test_to_lrc_and_shift() {
        let lines = parse_lrc("[00:01.12] test LyRiC\n[01:10.254] sssxxx");
        let output = to_lrc(&lines);
        assert!(output.contains("[00:01.12]test LyRiC"));
        assert!(output.contains("[01:10.254]sssxxx"));
        assert_eq!(parse_lrc(&output), lines);

        let shifted = shift(&lines, -2.0);
        assert_eq!(shifted[0].time, 0.0);
        assert!((shifted[1].time - 68.254).abs() < 1e-9);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00.00");
        assert_eq!(format_timestamp(75.5), "01:15.50");
        assert_eq!(format_timestamp(-3.0), "00:00.00");
        assert_eq!(format_timestamp(1.234), "00:01.234");
        assert_eq!(format_timestamp(0.1), "00:00.10");
    }
}
