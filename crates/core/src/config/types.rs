use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Anti-bot relay (FlareSolverr-compatible). Definitions that request
    /// the relay fail their fetch when this is unset.
    #[serde(default)]
    pub relay: Option<RelayConfig>,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Outbound HTTP fetch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u32,
    /// User-Agent sent on direct fetches. Some trackers reject
    /// unidentified clients.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u32 {
    30
}

fn default_user_agent() -> String {
    "Prowlarr/1.0 (Text-Mode-Operator)".to_string()
}

/// Anti-bot relay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Relay base URL (e.g., "http://localhost:8191")
    pub url: String,
    /// maxTimeout forwarded in the relay envelope, in milliseconds (default: 60000)
    #[serde(default = "default_relay_timeout_ms")]
    pub max_timeout_ms: u64,
}

fn default_relay_timeout_ms() -> u64 {
    60000
}

/// Search aggregator configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Upper bound on concurrently queried indexers (default: 4)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_indexers: usize,
    /// Overall search deadline in seconds (default: 60)
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_indexers: default_max_concurrent(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

fn default_max_concurrent() -> usize {
    4
}

fn default_deadline_secs() -> u64 {
    60
}
