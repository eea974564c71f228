use crate::error::{AvgError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of number sequences the upstream server can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Primes,
    Fibonacci,
    Evens,
    Random,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Primes,
        Category::Fibonacci,
        Category::Evens,
        Category::Random,
    ];

    /// Single-letter id used in upstream URLs (`/numbers/{id}`).
    #[must_use]
    pub fn id(self) -> char {
        match self {
            Category::Primes    => 'p',
            Category::Fibonacci => 'f',
            Category::Evens     => 'e',
            Category::Random    => 'r',
        }
    }

    /// Human-readable label, e.g. `"Prime"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Primes    => "Prime",
            Category::Fibonacci => "Fibonacci",
            Category::Evens     => "Even",
            Category::Random    => "Random",
        }
    }

    /// Path component appended to the upstream base URL.
    #[must_use]
    pub fn endpoint_path(self) -> String {
        format!("/numbers/{}", self.id())
    }

    /// Built-in fallback batch served when the upstream is unavailable.
    #[must_use]
    pub fn default_fallback(self) -> &'static [i64] {
        match self {
            Category::Primes    => &[2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47],
            Category::Fibonacci => &[0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377],
            Category::Evens     => &[2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24, 26, 28, 30],
            Category::Random    => &[15, 23, 6, 42, 37, 19, 94, 52, 13, 67, 81, 33, 44, 71, 29],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the short id (`"p"`) or the long name, singular or plural
/// (`"prime"`, `"Primes"`).
impl FromStr for Category {
    type Err = AvgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "prime" | "primes"        => Ok(Category::Primes),
            "f" | "fibonacci" | "fibonaccis" => Ok(Category::Fibonacci),
            "e" | "even" | "evens"          => Ok(Category::Evens),
            "r" | "random" | "randoms"      => Ok(Category::Random),
            _ => Err(AvgError::UnknownCategory(s.to_string())),
        }
    }
}

/// Per-category fallback batches, fixed at startup and served verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackTable {
    primes:    Vec<i64>,
    fibonacci: Vec<i64>,
    evens:     Vec<i64>,
    random:    Vec<i64>,
}

impl FallbackTable {
    #[must_use]
    pub fn get(&self, category: Category) -> &[i64] {
        match category {
            Category::Primes    => &self.primes,
            Category::Fibonacci => &self.fibonacci,
            Category::Evens     => &self.evens,
            Category::Random    => &self.random,
        }
    }

    /// Replace the batch served for `category`.
    pub fn set(&mut self, category: Category, numbers: Vec<i64>) {
        let slot = match category {
            Category::Primes    => &mut self.primes,
            Category::Fibonacci => &mut self.fibonacci,
            Category::Evens     => &mut self.evens,
            Category::Random    => &mut self.random,
        };
        *slot = numbers;
    }
}

impl Default for FallbackTable {
    fn default() -> Self {
        Self {
            primes:    Category::Primes.default_fallback().to_vec(),
            fibonacci: Category::Fibonacci.default_fallback().to_vec(),
            evens:     Category::Evens.default_fallback().to_vec(),
            random:    Category::Random.default_fallback().to_vec(),
        }
    }
}
