pub mod schema;
pub mod watcher;

pub use schema::{
    AvgConfig, FallbackConfig, PollConfig, UpstreamConfig, WindowConfig, DEFAULT_TIMEOUT_MS,
    STRICT_TIMEOUT_MS,
};
pub use watcher::ConfigWatcher;

use avgcalc_core::{AvgError, Result};
use std::path::{Path, PathBuf};

/// Parse the TOML file at `path` into an [`AvgConfig`].
///
/// A missing file is not an error: it logs a warning and yields the built-in
/// defaults. Unreadable or malformed files surface as [`AvgError::Config`].
pub fn load(path: impl AsRef<Path>) -> Result<AvgConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(AvgConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| AvgError::Config(format!("cannot read '{}': {e}", path.display())))?;

    toml::from_str(&raw).map_err(|e| AvgError::Config(format!("TOML parse error: {e}")))
}

/// `avgcalc/avgcalc.toml` under `$XDG_CONFIG_HOME`, or under `~/.config`
/// when that variable is unset.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("avgcalc").join("avgcalc.toml")
}
