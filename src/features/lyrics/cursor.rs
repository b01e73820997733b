//! Synchronized lyric highlight selection

use super::parser::LyricLine;

/// Index of the last line whose start time is <= `position`.
///
/// `None` before the first line, for empty lyrics or a NaN position.
/// `lines` must be sorted ascending, which `parse_lrc` guarantees.
pub fn cursor(lines: &[LyricLine], position: f64) -> Option<usize> {
    if position.is_nan() {
        return None;
    }
    lines
        .partition_point(|line| line.time <= position)
        .checked_sub(1)
}

/// Lines of the current track plus the highlighted index
#[derive(Debug, Clone, Default)]
pub struct LyricCursor {
    lines: Vec<LyricLine>,
    index: Option<usize>,
}

impl LyricCursor {
    pub fn new(lines: Vec<LyricLine>) -> Self {
        Self { lines, index: None }
    }

    /// Replace the line set and clear the highlight
    pub fn set_lines(&mut self, lines: Vec<LyricLine>) {
        self.lines = lines;
        self.index = None;
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current_line(&self) -> Option<&LyricLine> {
        self.index.and_then(|i| self.lines.get(i))
    }

    pub fn reset(&mut self) {
        self.index = None;
    }

    /// Re-evaluate for a new playback position.
    ///
    /// Returns the new index only when it differs from the previous one.
    pub fn update(&mut self, position: f64) -> Option<Option<usize>> {
        let index = cursor(&self.lines, position);
        if index == self.index {
            return None;
        }
        tracing::debug!("lyric index {:?} -> {:?} at {:.2}s", self.index, index, position);
        self.index = index;
        Some(index)
    }

    /// Restore a persisted index without emitting a change
    pub fn restore(&mut self, index: Option<usize>) {
        self.index = index.filter(|&i| i < self.lines.len());
    }
}
