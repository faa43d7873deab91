//! Document fetching.
//!
//! Two interchangeable fetch paths behind one [`Fetcher`] seam: a direct
//! HTTP GET and the anti-bot relay adapter. Every consumer (row parser,
//! prober, aggregator) receives raw document text and does not care which
//! path produced it.

mod relay;

pub use relay::RelayFetcher;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::FetchConfig;

/// Fetch failure. Recorded per definition during a search; never retried by
/// the core.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP Status: {0}")]
    Status(u16),

    #[error("Relay Status: {status}, Msg: {message}")]
    Relay { status: String, message: String },

    #[error("Malformed relay envelope: {0}")]
    Envelope(String),

    #[error("Relay requested but not configured")]
    RelayUnavailable,
}

/// A document fetch path. The relay adapter is a drop-in substitute for the
/// direct path: same contract, raw document text out.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch path name for logging.
    fn name(&self) -> &str;

    /// Fetch the document at `url`.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain HTTP GET with an identifying User-Agent. Some trackers reject
/// unidentified clients.
pub struct DirectFetcher {
    client: Client,
    user_agent: String,
}

impl DirectFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            user_agent: config.user_agent.clone(),
        }
    }
}

#[async_trait]
impl Fetcher for DirectFetcher {
    fn name(&self) -> &str {
        "direct"
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(url = url, "direct fetch");
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))
    }
}

pub(crate) fn map_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Connection(e.to_string())
    }
}
