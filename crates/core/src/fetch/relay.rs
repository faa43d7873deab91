//! Anti-bot relay adapter (FlareSolverr protocol).
//!
//! Proxies a GET through a remote unblocking relay: the relay fetches the
//! target in a real browser session and returns the rendered page inside a
//! JSON envelope. Wire format is fixed by the relay:
//!
//! request: `POST {base}/v1` with `{"cmd":"request.get","url":...,"maxTimeout":...}`
//! response: `{"status":"...","message":...,"solution":{"response":"<html>"}}`
//!
//! Only `status == "ok"` yields usable content.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{map_transport_error, FetchError, Fetcher};
use crate::config::RelayConfig;

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    cmd: &'static str,
    url: &'a str,
    #[serde(rename = "maxTimeout")]
    max_timeout: u64,
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    solution: Option<RelaySolution>,
}

#[derive(Debug, Deserialize)]
struct RelaySolution {
    /// Rendered page HTML.
    response: String,
}

/// Fetches documents through a FlareSolverr-compatible relay.
pub struct RelayFetcher {
    client: Client,
    endpoint: String,
    max_timeout_ms: u64,
}

impl RelayFetcher {
    pub fn new(config: &RelayConfig, request_timeout_secs: u32) -> Self {
        let client = Client::builder()
            // The relay itself needs time to solve a challenge, so the HTTP
            // timeout must cover the envelope's maxTimeout.
            .timeout(
                Duration::from_millis(config.max_timeout_ms)
                    + Duration::from_secs(request_timeout_secs as u64),
            )
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            endpoint: format!("{}/v1", config.url.trim_end_matches('/')),
            max_timeout_ms: config.max_timeout_ms,
        }
    }
}

#[async_trait]
impl Fetcher for RelayFetcher {
    fn name(&self) -> &str {
        "relay"
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(url = url, endpoint = %self.endpoint, "relay fetch");
        let body = RelayRequest {
            cmd: "request.get",
            url,
            max_timeout: self.max_timeout_ms,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        decode_envelope(&text)
    }
}

/// Unwrap a relay response envelope into the rendered page body.
fn decode_envelope(body: &str) -> Result<String, FetchError> {
    let envelope: RelayResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Envelope(e.to_string()))?;

    if envelope.status != "ok" {
        return Err(FetchError::Relay {
            status: envelope.status,
            message: envelope.message.unwrap_or_default(),
        });
    }

    match envelope.solution {
        Some(solution) => Ok(solution.response),
        None => Err(FetchError::Envelope(
            "status ok but no solution in envelope".to_string(),
        )),
    }
}
