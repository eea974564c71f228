use crate::{Session, Snapshot};
use avgcalc_core::{Category, WindowSize};
use avgcalc_fetch::NumberSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// Requests accepted by a running poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Fetch now instead of waiting for the next tick.
    Refresh,
    /// Switch category (resets the window if it differs) and fetch.
    SelectCategory(Category),
    /// Reset the window under a new capacity and fetch.
    Resize(WindowSize),
    Shutdown,
}

/// Control side of a poller spawned with [`spawn_poller`].
#[derive(Debug, Clone)]
pub struct PollerHandle {
    tx:   mpsc::Sender<Command>,
    busy: Arc<AtomicBool>,
}

impl PollerHandle {
    /// Ask for an immediate refresh. Returns `false` (and does nothing) while
    /// another refresh is queued or running.
    pub fn refresh(&self) -> bool {
        if self.busy.swap(true, Ordering::AcqRel) {
            debug!("refresh ignored; one is already outstanding");
            return false;
        }
        if self.tx.try_send(Command::Refresh).is_err() {
            self.busy.store(false, Ordering::Release);
            return false;
        }
        true
    }

    pub async fn select_category(&self, category: Category) -> bool {
        self.tx.send(Command::SelectCategory(category)).await.is_ok()
    }

    pub async fn resize(&self, window_size: WindowSize) -> bool {
        self.tx.send(Command::Resize(window_size)).await.is_ok()
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }
}

/// Spawn a background Tokio task that refreshes `session` every `interval`
/// (the first cycle runs immediately) and forwards a [`Snapshot`] after each
/// fold through the returned channel.
///
/// The task owns the session, so all cycles run one at a time. It stops on
/// [`Command::Shutdown`], when every handle is dropped, or when the receiver
/// is dropped.
pub fn spawn_poller<S>(
    session: Session<S>,
    interval: Duration,
) -> (PollerHandle, mpsc::Receiver<Snapshot>)
where
    S: NumberSource + 'static,
{
    let (cmd_tx, mut cmd_rx) = mpsc::channel(8);
    let (tx, rx) = mpsc::channel(4);
    let busy = Arc::new(AtomicBool::new(false));
    let handle = PollerHandle { tx: cmd_tx, busy: Arc::clone(&busy) };

    tokio::spawn(async move {
        let mut session = session;
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let run = tokio::select! {
                biased;
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Refresh) => true,
                    Some(Command::SelectCategory(category)) => {
                        session.select_category(category);
                        busy.store(true, Ordering::Release);
                        true
                    }
                    Some(Command::Resize(size)) => {
                        session.resize(size);
                        busy.store(true, Ordering::Release);
                        true
                    }
                    Some(Command::Shutdown) | None => break,
                },
                // a manual refresh is already queued; let it run instead
                _ = ticker.tick() => !busy.swap(true, Ordering::AcqRel),
            };
            if !run {
                continue;
            }

            session.refresh().await;
            busy.store(false, Ordering::Release);

            let Some(snapshot) = session.snapshot() else { continue };
            if tx.send(snapshot).await.is_err() {
                break; // all receivers dropped
            }
        }

        debug!(category = %session.category(), "poller stopped");
    });

    (handle, rx)
}
