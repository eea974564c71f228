use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Watches the config file and signals whenever it is written or replaced.
///
/// The parent directory is watched rather than the file itself, so editors
/// that save by renaming a temp file over the original are still noticed.
/// Bursts of events collapse into a single pending signal.
///
/// # Example
/// ```no_run
/// # async fn demo() {
/// let (_watcher, mut rx) = avgcalc_config::ConfigWatcher::spawn("/home/user/.config/avgcalc/avgcalc.toml");
/// while rx.recv().await.is_some() {
///     println!("config changed, reloading");
/// }
/// # }
/// ```
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    /// Spawn a filesystem watcher for `path`.
    /// Returns the watcher handle and a receiver that fires on every detected change.
    pub fn spawn(path: impl AsRef<Path>) -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        let path = path.as_ref().to_path_buf();
        let watcher = Self { path: path.clone() };

        tokio::spawn(watch_loop(path, tx));

        (watcher, rx)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn watch_loop(path: PathBuf, tx: mpsc::Sender<()>) {
    use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
    use std::time::Duration;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let Some(file_name) = path.file_name().map(|n| n.to_os_string()) else {
        error!("Config path '{}' has no file name; not watching", path.display());
        return;
    };

    let (sync_tx, mut sync_rx) = mpsc::channel::<notify::Result<Event>>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = sync_tx.blocking_send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create filesystem watcher: {e}");
            return;
        }
    };

    if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        error!("Failed to watch '{}': {e}", dir.display());
        return;
    }

    info!("Watching config file: {}", path.display());

    while let Some(event) = sync_rx.recv().await {
        match event {
            Ok(e) => {
                use notify::EventKind::*;
                let touches_config = e
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()));
                if !touches_config || !matches!(e.kind, Modify(_) | Create(_)) {
                    continue;
                }
                match tx.try_send(()) {
                    Ok(()) => debug!("Config change detected"),
                    Err(mpsc::error::TrySendError::Full(())) => {} // reload already pending
                    Err(mpsc::error::TrySendError::Closed(())) => break,
                }
            }
            Err(e) => warn!("Watcher error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signals_after_config_write() {
        let dir = std::env::temp_dir().join(format!("avgcalc-watch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("avgcalc.toml");
        std::fs::write(&path, "[window]\nsize = 5\n").unwrap();

        let (watcher, mut rx) = ConfigWatcher::spawn(&path);
        assert_eq!(watcher.path(), path.as_path());

        // give the watcher time to register before writing
        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::write(&path, "[window]\nsize = 15\n").unwrap();

        let signal = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(matches!(signal, Ok(Some(()))));
    }
}
