//! Upstream number fetching with a hard timeout and fallback batches.
//!
//! Every failure mode (timeout, connection error, bad status, bad body) is
//! absorbed here: callers always receive a [`Batch`](avgcalc_core::Batch),
//! tagged `is_fallback` when it came from the fallback table.

pub mod client;
pub mod error;
pub mod race;
pub mod source;

pub use client::{FetchOutcome, Fetcher, NumbersResponse};
pub use error::FetchError;
pub use race::{race_timeout, Race, Settled};
pub use source::NumberSource;
