//! Queue navigation - next/prev index calculation for every play mode
//!
//! All code that needs to determine which track comes next or previous
//! goes through `QueueNavigator`.

use rand::Rng;

use crate::features::settings::PlayMode;

/// Calculates next/prev indices from a queue length, position and mode
pub struct QueueNavigator {
    queue_len: usize,
    current_idx: Option<usize>,
    play_mode: PlayMode,
}

impl QueueNavigator {
    pub fn new(queue_len: usize, current_idx: Option<usize>, play_mode: PlayMode) -> Self {
        Self {
            queue_len,
            current_idx,
            play_mode,
        }
    }

    /// Track to play when the current one ends.
    ///
    /// `None` means stop. Shuffle never picks the current track unless it is
    /// the only one.
    pub fn next_index<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        if self.queue_len == 0 {
            return None;
        }

        let Some(current) = self.current_idx else {
            return match self.play_mode {
                PlayMode::Shuffle => Some(rng.random_range(0..self.queue_len)),
                _ => Some(0),
            };
        };

        match self.play_mode {
            PlayMode::Shuffle => {
                if self.queue_len == 1 {
                    return Some(current);
                }
                // Uniform over the other len - 1 positions
                let pick = rng.random_range(0..self.queue_len - 1);
                Some(if pick >= current { pick + 1 } else { pick })
            }
            PlayMode::LoopAll => Some((current + 1) % self.queue_len),
            PlayMode::Sequential => {
                let next = current + 1;
                if next >= self.queue_len { None } else { Some(next) }
            }
        }
    }

    /// Previous track, wrapping to the last one from the start
    pub fn prev_index(&self) -> Option<usize> {
        if self.queue_len == 0 {
            return None;
        }
        match self.current_idx {
            Some(0) | None => Some(self.queue_len - 1),
            Some(current) => Some(current - 1),
        }
    }
}
