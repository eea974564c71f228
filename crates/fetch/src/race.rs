use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

/// One-shot flag deciding which of two completion sources wins.
///
/// The first caller of [`Settled::claim`] gets `true`; every later call gets
/// `false` and must treat its result as void.
#[derive(Debug, Default)]
pub struct Settled(AtomicBool);

impl Settled {
    pub fn claim(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_settled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Result of racing a request against a timer.
#[derive(Debug, PartialEq, Eq)]
pub enum Race<T> {
    /// The request finished first.
    Completed(T),
    /// The timer fired first; the request was aborted.
    TimedOut,
    /// The request task ended without producing a value (panic or abort).
    Abandoned,
}

/// Aborts the spawned request if the race itself is dropped mid-flight.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run `request` on its own task and race it against `timeout`.
///
/// Both sides go through a shared [`Settled`] guard, so exactly one
/// completion is observed. A response landing after the timer has claimed
/// the guard is dropped on the request task and never reaches the caller.
pub async fn race_timeout<T, F>(request: F, timeout: Duration) -> Race<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let settled = Arc::new(Settled::default());
    let (tx, mut rx) = oneshot::channel();

    let guard = Arc::clone(&settled);
    let task = AbortOnDrop(tokio::spawn(async move {
        let out = request.await;
        if guard.claim() {
            let _ = tx.send(out);
        } else {
            debug!("discarding response that arrived after the timeout");
        }
    }));

    tokio::select! {
        res = &mut rx => return settle(res),
        _ = tokio::time::sleep(timeout) => {}
    }

    if settled.claim() {
        task.0.abort();
        return Race::TimedOut;
    }
    // The request claimed the guard just before the timer fired; its value
    // is already on the way.
    settle(rx.await)
}

fn settle<T>(res: Result<T, oneshot::error::RecvError>) -> Race<T> {
    match res {
        Ok(out) => Race::Completed(out),
        Err(_) => Race::Abandoned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn only_first_claim_wins() {
        let settled = Settled::default();
        assert!(!settled.is_settled());
        assert!(settled.claim());
        assert!(!settled.claim());
        assert!(settled.is_settled());
    }

    #[tokio::test]
    async fn fast_request_completes() {
        let out = race_timeout(async { 42 }, Duration::from_secs(1)).await;
        assert_eq!(out, Race::Completed(42));
    }

    #[tokio::test]
    async fn slow_request_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            1
        };
        let started = std::time::Instant::now();
        let out = race_timeout(slow, Duration::from_millis(50)).await;
        assert_eq!(out, Race::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn late_response_is_never_delivered() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&finished);
        let slow = async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            counter.fetch_add(1, Ordering::SeqCst);
            7
        };

        let out = race_timeout(slow, Duration::from_millis(10)).await;
        assert_eq!(out, Race::TimedOut);

        // the aborted request never runs to completion
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn panicking_request_is_abandoned() {
        let request = async {
            let missing: Option<i32> = None;
            missing.expect("boom")
        };
        let out = race_timeout(request, Duration::from_secs(1)).await;
        assert_eq!(out, Race::Abandoned);
    }
}
