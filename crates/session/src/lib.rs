//! Explicit owner of one category's sliding window.
//!
//! A [`Session`] holds the window state for the currently selected category
//! and window size, drives fetch-and-fold cycles, and discards the state when
//! either selection changes. There is no global registry: callers own their
//! sessions.

pub mod poller;

pub use poller::{spawn_poller, Command, PollerHandle};

use avgcalc_core::{fold, Category, WindowSize, WindowState, WindowStats};
use avgcalc_fetch::NumberSource;
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{info, warn};

/// Window state for one category/size selection.
#[derive(Debug)]
pub struct Session<S> {
    source:      S,
    category:    Category,
    window_size: WindowSize,
    state:       Option<WindowState>,
    updated_at:  Option<DateTime<Local>>,
}

/// Everything a front end needs to render the latest update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub category:    Category,
    pub window_size: WindowSize,
    pub state:       WindowState,
    /// `None` while the window is empty.
    pub stats:       Option<WindowStats>,
    pub updated_at:  DateTime<Local>,
}

impl<S: NumberSource> Session<S> {
    pub fn new(source: S, category: Category, window_size: WindowSize) -> Self {
        Self {
            source,
            category,
            window_size,
            state: None,
            updated_at: None,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn window_size(&self) -> WindowSize {
        self.window_size
    }

    /// Latest window state, `None` until the first refresh after a reset.
    pub fn state(&self) -> Option<&WindowState> {
        self.state.as_ref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        self.updated_at
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Switch category. Returns `true` if the window was discarded.
    pub fn select_category(&mut self, category: Category) -> bool {
        if category == self.category {
            return false;
        }
        info!(from = %self.category, to = %category, "category changed; window reset");
        self.category = category;
        self.reset();
        true
    }

    /// Change capacity. The window always starts over, even for the same size.
    pub fn resize(&mut self, window_size: WindowSize) {
        info!(from = %self.window_size, to = %window_size, "window size changed; window reset");
        self.window_size = window_size;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.state = None;
        self.updated_at = None;
    }

    /// Fetch one batch and fold it into the window.
    ///
    /// Taking `&mut self` keeps cycles on one session strictly sequential.
    pub async fn refresh(&mut self) -> &WindowState {
        let batch = self.source.next_batch(self.category).await;
        let next = fold(self.state.as_ref(), &batch, self.window_size);

        if next.is_fallback {
            warn!(
                category = %self.category,
                "using fallback {} numbers - upstream unavailable",
                self.category.label()
            );
        }
        info!(
            category = %self.category,
            received = next.last_batch.len(),
            window = next.current_window.len(),
            average = next.average,
            "window updated"
        );

        self.updated_at = Some(Local::now());
        self.state.insert(next)
    }

    pub fn stats(&self) -> Option<WindowStats> {
        self.state.as_ref()?.stats(self.window_size)
    }

    /// Renderable view of the latest update, `None` before the first refresh.
    pub fn snapshot(&self) -> Option<Snapshot> {
        let state = self.state.clone()?;
        Some(Snapshot {
            category:    self.category,
            window_size: self.window_size,
            stats:       state.stats(self.window_size),
            updated_at:  self.updated_at.unwrap_or_else(Local::now),
            state,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedSource;
    use super::*;
    use avgcalc_core::Batch;

    fn size(n: i64) -> WindowSize {
        WindowSize::new(n).unwrap()
    }

    #[tokio::test]
    async fn consecutive_refreshes_slide_the_window() {
        let source = ScriptedSource::new([
            Batch::fresh(vec![2, 3, 5, 7, 11, 13]),
            Batch::fresh(vec![7, 11, 17, 19]),
        ]);
        let mut session = Session::new(source, Category::Primes, size(5));
        assert!(session.state().is_none());

        let first = session.refresh().await.clone();
        assert_eq!(first.current_window, vec![2, 3, 5, 7, 11]);
        assert_eq!(first.average, 5.6);

        let second = session.refresh().await;
        assert_eq!(second.current_window, vec![5, 7, 11, 17, 19]);
        assert_eq!(second.previous_window, vec![2, 3, 5, 7, 11]);
        assert_eq!(second.average, 11.8);

        assert_eq!(session.source().requested(), vec![Category::Primes; 2]);
        assert!(session.updated_at().is_some());
    }

    #[tokio::test]
    async fn empty_batch_keeps_window_and_average() {
        let source = ScriptedSource::new([Batch::fresh(vec![10, 20, 30])]);
        let mut session = Session::new(source, Category::Evens, size(5));

        let before = session.refresh().await.clone();
        let after = session.refresh().await;

        assert_eq!(after.current_window, before.current_window);
        assert_eq!(after.previous_window, before.current_window);
        assert_eq!(after.average, 20.0);
    }

    #[tokio::test]
    async fn resize_discards_window() {
        let source = ScriptedSource::new([
            Batch::fresh(vec![1, 2, 3, 4]),
            Batch::fresh(vec![5, 6, 7]),
        ]);
        let mut session = Session::new(source, Category::Random, size(10));
        session.refresh().await;

        session.resize(size(2));
        assert!(session.state().is_none());
        assert!(session.snapshot().is_none());

        // first fold after a reset: seeded from the head of the batch
        let state = session.refresh().await;
        assert_eq!(state.current_window, vec![5, 6]);
        assert!(state.previous_window.is_empty());
    }

    #[tokio::test]
    async fn selecting_another_category_starts_over() {
        let source = ScriptedSource::new([
            Batch::fresh(vec![1, 2, 3]),
            Batch::fresh(vec![4, 5]),
        ]);
        let mut session = Session::new(source, Category::Primes, size(5));
        session.refresh().await;

        assert!(!session.select_category(Category::Primes));
        assert!(session.state().is_some());

        assert!(session.select_category(Category::Fibonacci));
        assert!(session.state().is_none());

        let state = session.refresh().await;
        assert_eq!(state.current_window, vec![4, 5]);
        assert_eq!(
            session.source().requested(),
            vec![Category::Primes, Category::Fibonacci]
        );
    }

    #[tokio::test]
    async fn snapshot_carries_fallback_flag_and_stats() {
        let numbers = Category::Primes.default_fallback().to_vec();
        let source = ScriptedSource::new([Batch::fallback(numbers.clone())]);
        let mut session = Session::new(source, Category::Primes, size(10));
        session.refresh().await;

        let snap = session.snapshot().unwrap();
        assert!(snap.state.is_fallback);
        assert_eq!(snap.state.current_window, numbers[..10].to_vec());
        let stats = snap.stats.unwrap();
        assert_eq!((stats.min, stats.max, stats.count), (2, 29, 10));
        assert!((stats.usage_percent - 100.0).abs() < f64::EPSILON);
        assert_eq!(session.stats(), Some(stats));
    }
}
