use crate::window::WindowSize;
use serde::{Deserialize, Serialize};

/// One batch of numbers as returned by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Numbers in the order the upstream sent them.
    pub numbers: Vec<i64>,
    /// `true` when the numbers come from the fallback table.
    pub is_fallback: bool,
}

impl Batch {
    pub fn fresh(numbers: Vec<i64>) -> Self {
        Self { numbers, is_fallback: false }
    }

    pub fn fallback(numbers: Vec<i64>) -> Self {
        Self { numbers, is_fallback: true }
    }
}

/// Window contents after a fold. Produced only by [`crate::window::fold`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    /// Window before the latest update, oldest first.
    pub previous_window: Vec<i64>,
    /// Window after the latest update, oldest first. Values appended after
    /// the first fold are never already present.
    pub current_window: Vec<i64>,
    /// The raw batch received on the latest fetch.
    pub last_batch: Vec<i64>,
    /// Mean of `current_window`, rounded to two decimals (0 when empty).
    pub average: f64,
    pub is_fallback: bool,
}

impl WindowState {
    /// Display statistics for the current window, `None` when it is empty.
    #[must_use]
    pub fn stats(&self, window_size: WindowSize) -> Option<WindowStats> {
        let min = *self.current_window.iter().min()?;
        let max = *self.current_window.iter().max()?;
        let count = self.current_window.len();
        let capacity = window_size.get();

        Some(WindowStats {
            count,
            capacity,
            min,
            max,
            usage_percent: count as f64 / capacity as f64 * 100.0,
        })
    }
}

/// Presentation-only figures derived from a [`WindowState`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowStats {
    pub count: usize,
    pub capacity: usize,
    pub min: i64,
    pub max: i64,
    /// Window fill level in `[0, 100]`.
    pub usage_percent: f64,
}
