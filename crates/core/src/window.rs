//! The sliding-window fold.
//!
//! A window holds the most recent numbers seen for one category, oldest
//! first. The first batch seeds it with its raw head; every later batch is
//! folded in by appending the values the window has not seen yet and
//! evicting from the head once the capacity is exceeded. The fold is pure:
//! the previous state is only read.

use crate::error::{AvgError, Result};
use crate::state::{Batch, WindowState};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;

/// Validated window capacity. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowSize(NonZeroUsize);

impl WindowSize {
    /// Sizes offered by the reference front end. Any positive size is valid.
    pub const PRESETS: [usize; 4] = [5, 10, 15, 20];

    /// Reject zero and negative sizes instead of clamping them.
    pub fn new(raw: i64) -> Result<Self> {
        usize::try_from(raw)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self)
            .ok_or(AvgError::InvalidWindowSize(raw))
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<i64> for WindowSize {
    type Error = AvgError;

    fn try_from(raw: i64) -> Result<Self> {
        Self::new(raw)
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fold `batch` into `previous`, producing the next window state.
///
/// With no previous state the window is the raw head of the batch (its first
/// `window_size` numbers, not deduplicated). Otherwise unseen values are
/// appended to the carried window and the oldest entries are evicted.
#[must_use]
pub fn fold(previous: Option<&WindowState>, batch: &Batch, window_size: WindowSize) -> WindowState {
    let capacity = window_size.get();

    let (previous_window, current_window) = match previous {
        None => {
            let seeded: Vec<i64> = batch.numbers.iter().copied().take(capacity).collect();
            (Vec::new(), seeded)
        }
        Some(prev) => {
            let carried = &prev.current_window;

            // Membership grows while walking, so duplicates inside the batch
            // collapse as well.
            let mut seen: HashSet<i64> = carried.iter().copied().collect();
            let incoming = batch.numbers.iter().copied().filter(|n| seen.insert(*n));

            let mut combined: Vec<i64> = carried.iter().copied().chain(incoming).collect();
            if combined.len() > capacity {
                combined.drain(..combined.len() - capacity);
            }
            (carried.clone(), combined)
        }
    };

    WindowState {
        average: average(&current_window),
        previous_window,
        current_window,
        last_batch: batch.numbers.clone(),
        is_fallback: batch.is_fallback,
    }
}

/// Mean of `numbers` rounded to two decimals; 0 for an empty slice.
fn average(numbers: &[i64]) -> f64 {
    if numbers.is_empty() {
        return 0.0;
    }
    let sum: i128 = numbers.iter().map(|&n| i128::from(n)).sum();
    round2(sum as f64 / numbers.len() as f64)
}

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
