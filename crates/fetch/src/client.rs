use crate::error::FetchError;
use crate::race::{race_timeout, Race};
use avgcalc_core::{Batch, Category, FallbackTable};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// JSON shape served by `GET /numbers/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NumbersResponse {
    pub numbers: Vec<i64>,
}

/// How a single fetch attempt ended, before fallback substitution.
#[derive(Debug)]
pub enum FetchOutcome {
    Fresh(Vec<i64>),
    TimedOut,
    Failed(FetchError),
}

/// Upstream number client.
///
/// Cheap to clone; clones share the connection pool and the fallback table.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client:   Client,
    base_url: String,
    timeout:  Duration,
    fallback: Arc<FallbackTable>,
}

impl Fetcher {
    /// Create a fetcher using the built-in fallback batches.
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            fallback: Arc::new(FallbackTable::default()),
        }
    }

    /// Replace the fallback batches served on failure.
    #[must_use]
    pub fn with_fallback(mut self, table: FallbackTable) -> Self {
        self.fallback = Arc::new(table);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full endpoint URL for `category`.
    pub fn url_for(&self, category: Category) -> String {
        format!("{}{}", self.base_url, category.endpoint_path())
    }

    /// Fetch a batch for `category`. Never fails: timeouts and transport
    /// errors yield the category's fallback batch with `is_fallback = true`.
    pub async fn fetch(&self, category: Category) -> Batch {
        match self.fetch_outcome(category).await {
            FetchOutcome::Fresh(numbers) => {
                debug!(%category, count = numbers.len(), "fetched numbers");
                Batch::fresh(numbers)
            }
            FetchOutcome::TimedOut => {
                warn!(
                    %category,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "request timed out; using fallback numbers"
                );
                self.fallback_batch(category)
            }
            FetchOutcome::Failed(e) => {
                warn!(%category, error = %e, "request failed; using fallback numbers");
                self.fallback_batch(category)
            }
        }
    }

    /// Run one request against the timeout without substituting fallback data.
    pub async fn fetch_outcome(&self, category: Category) -> FetchOutcome {
        let request = request_numbers(self.client.clone(), self.url_for(category));

        match race_timeout(request, self.timeout).await {
            Race::Completed(Ok(numbers)) => FetchOutcome::Fresh(numbers),
            Race::Completed(Err(e)) => FetchOutcome::Failed(e),
            Race::TimedOut => FetchOutcome::TimedOut,
            Race::Abandoned => FetchOutcome::Failed(FetchError::Abandoned),
        }
    }

    pub fn fallback_batch(&self, category: Category) -> Batch {
        Batch::fallback(self.fallback.get(category).to_vec())
    }
}

async fn request_numbers(client: Client, url: String) -> Result<Vec<i64>, FetchError> {
    let response = client.get(&url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let body = response.bytes().await?;
    let parsed: NumbersResponse = serde_json::from_slice(&body)?;
    Ok(parsed.numbers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn fetcher(base_url: &str, timeout_ms: u64) -> Fetcher {
        // tests only talk to loopback; keep ambient proxy settings out of it
        let client = Client::builder().no_proxy().build().unwrap();
        Fetcher::new(client, base_url, Duration::from_millis(timeout_ms))
    }

    #[test]
    fn url_joins_base_and_endpoint() {
        let f = fetcher("http://localhost:9876/", 500);
        assert_eq!(f.url_for(Category::Primes), "http://localhost:9876/numbers/p");
        assert_eq!(f.url_for(Category::Random), "http://localhost:9876/numbers/r");
    }

    #[tokio::test]
    async fn successful_fetch_returns_fresh_batch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/numbers/p")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"numbers":[2,3,5,7,11,13]}"#)
            .create_async()
            .await;

        let batch = fetcher(&server.url(), 3_000).fetch(Category::Primes).await;

        assert!(!batch.is_fallback);
        assert_eq!(batch.numbers, vec![2, 3, 5, 7, 11, 13]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_numbers_is_not_a_failure() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/numbers/e")
            .with_status(200)
            .with_body(r#"{"numbers":[]}"#)
            .create_async()
            .await;

        let batch = fetcher(&server.url(), 3_000).fetch(Category::Evens).await;

        assert!(!batch.is_fallback);
        assert!(batch.numbers.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/numbers/f")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let f = fetcher(&server.url(), 3_000);
        match f.fetch_outcome(Category::Fibonacci).await {
            FetchOutcome::Failed(FetchError::Status(status)) => assert_eq!(status.as_u16(), 503),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let batch = f.fetch(Category::Fibonacci).await;
        assert!(batch.is_fallback);
        assert_eq!(batch.numbers, Category::Fibonacci.default_fallback());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_body_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/numbers/r")
            .with_status(200)
            .with_body(r#"{"values":[1,2,3]}"#)
            .create_async()
            .await;

        let f = fetcher(&server.url(), 3_000);
        assert!(matches!(
            f.fetch_outcome(Category::Random).await,
            FetchOutcome::Failed(FetchError::Body(_))
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn connection_refused_falls_back() {
        // bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let batch = fetcher(&format!("http://{addr}"), 3_000).fetch(Category::Evens).await;
        assert!(batch.is_fallback);
        assert_eq!(batch.numbers, Category::Evens.default_fallback());
    }

    #[tokio::test]
    async fn silent_server_times_out_to_fallback() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accept connections and never answer
        let hold = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let f = fetcher(&format!("http://{addr}"), 100);
        let started = Instant::now();
        assert!(matches!(f.fetch_outcome(Category::Primes).await, FetchOutcome::TimedOut));

        let batch = f.fetch(Category::Primes).await;
        assert!(batch.is_fallback);
        assert_eq!(batch.numbers, Category::Primes.default_fallback());
        assert!(started.elapsed() < Duration::from_secs(2));

        hold.abort();
    }

    #[tokio::test]
    async fn configured_fallback_is_served_verbatim() {
        let mut table = FallbackTable::default();
        table.set(Category::Random, vec![9, 9, 8]);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let f = fetcher(&format!("http://{addr}"), 500).with_fallback(table);
        let batch = f.fetch(Category::Random).await;
        assert_eq!(batch, Batch::fallback(vec![9, 9, 8]));
    }
}
