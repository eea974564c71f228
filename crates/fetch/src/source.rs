use crate::client::Fetcher;
use avgcalc_core::{Batch, Category};
use std::future::Future;

/// Anything that can hand out a batch of numbers for a category.
///
/// Implementations must absorb their own failures; the window engine only
/// ever sees a batch, possibly tagged as fallback.
pub trait NumberSource: Send + Sync {
    fn next_batch(&self, category: Category) -> impl Future<Output = Batch> + Send;
}

impl NumberSource for Fetcher {
    fn next_batch(&self, category: Category) -> impl Future<Output = Batch> + Send {
        self.fetch(category)
    }
}
