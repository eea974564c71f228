use avgcalc_core::{Category, FallbackTable, Result, WindowSize};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout suited to a local or lenient upstream server.
pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;
/// Timeout expected by the strict external test server.
pub const STRICT_TIMEOUT_MS: u64 = 500;

/// Root configuration structure parsed from `avgcalc.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvgConfig {
    /// Where numbers come from and how long to wait for them.
    pub upstream: UpstreamConfig,
    /// Window capacity.
    pub window: WindowConfig,
    /// Refresh cadence for `watch` mode.
    pub poll: PollConfig,
    /// Per-category overrides of the built-in fallback batches.
    pub fallback: FallbackConfig,
}

impl AvgConfig {
    /// Validated window size. Zero and negative values are rejected.
    pub fn window_size(&self) -> Result<WindowSize> {
        WindowSize::new(self.window.size)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.upstream.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll.interval_ms)
    }

    /// Built-in fallback batches with any configured overrides applied.
    pub fn fallback_table(&self) -> FallbackTable {
        let mut table = FallbackTable::default();
        for category in Category::ALL {
            if let Some(numbers) = self.fallback.get(category) {
                table.set(category, numbers.to_vec());
            }
        }
        table
    }
}

/// Upstream number server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL; category endpoints are `{base_url}/numbers/{id}`.
    pub base_url: String,
    /// Hard per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url:   "http://localhost:9876".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Kept signed so a negative value reaches validation instead of
    /// failing as a TOML type error.
    pub size: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { size: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_ms: 5_000 }
    }
}

/// Optional replacement batches, keyed by category name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub primes:    Option<Vec<i64>>,
    pub fibonacci: Option<Vec<i64>>,
    pub evens:     Option<Vec<i64>>,
    pub random:    Option<Vec<i64>>,
}

impl FallbackConfig {
    pub fn get(&self, category: Category) -> Option<&[i64]> {
        match category {
            Category::Primes    => self.primes.as_deref(),
            Category::Fibonacci => self.fibonacci.as_deref(),
            Category::Evens     => self.evens.as_deref(),
            Category::Random    => self.random.as_deref(),
        }
    }
}
