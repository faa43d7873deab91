//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::fetch::{FetchError, Fetcher};

/// Canned behavior for one URL.
#[derive(Debug, Clone)]
enum MockResponse {
    Body(String),
    ConnectionError(String),
    Status(u16),
    /// Never completes; used to exercise deadlines.
    Hang,
}

/// Mock implementation of the [`Fetcher`] trait.
///
/// Provides controllable behavior for testing:
/// - Canned document bodies per URL
/// - Simulated connection failures, HTTP statuses and hangs
/// - Recorded fetch URLs for assertions
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    fetched: Arc<RwLock<Vec<String>>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(HashMap::new())),
            fetched: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Serve `body` for `url`.
    pub async fn respond(&self, url: &str, body: &str) {
        self.responses
            .write()
            .await
            .insert(url.to_string(), MockResponse::Body(body.to_string()));
    }

    /// Fail `url` with a connection error.
    pub async fn fail(&self, url: &str, message: &str) {
        self.responses.write().await.insert(
            url.to_string(),
            MockResponse::ConnectionError(message.to_string()),
        );
    }

    /// Answer `url` with a bare HTTP status.
    pub async fn status(&self, url: &str, code: u16) {
        self.responses
            .write()
            .await
            .insert(url.to_string(), MockResponse::Status(code));
    }

    /// Never answer `url`.
    pub async fn hang(&self, url: &str) {
        self.responses
            .write()
            .await
            .insert(url.to_string(), MockResponse::Hang);
    }

    /// URLs fetched so far, in request order.
    pub async fn fetched(&self) -> Vec<String> {
        self.fetched.read().await.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.fetched.write().await.push(url.to_string());

        let response = self.responses.read().await.get(url).cloned();
        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::ConnectionError(message)) => Err(FetchError::Connection(message)),
            Some(MockResponse::Status(code)) => Err(FetchError::Status(code)),
            Some(MockResponse::Hang) => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
            None => Err(FetchError::Status(404)),
        }
    }
}
