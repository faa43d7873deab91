//! Reachability prober.
//!
//! A probe is one fetch of an indexer's target endpoint: the first search
//! path rendered with empty keywords (base link when templating cannot
//! resolve), through whichever fetch path the caller supplies. No retries;
//! re-probe cadence belongs to the caller.

use serde::Serialize;
use tracing::debug;

use crate::definition::IndexerDefinition;
use crate::fetch::Fetcher;
use crate::template::build_search_url;

/// Result of one reachability check. The reason string is suitable for
/// surfacing verbatim to an operator.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Healthy,
    Unhealthy { reason: String },
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Check whether the indexer's target endpoint responds successfully via
/// the given fetch path.
pub async fn probe(def: &IndexerDefinition, fetcher: &dyn Fetcher) -> ProbeOutcome {
    let Some(url) = build_search_url(def, "") else {
        return ProbeOutcome::Unhealthy {
            reason: "No links defined".to_string(),
        };
    };

    debug!(indexer = %def.id, url = %url, path = fetcher.name(), "probing indexer");
    match fetcher.fetch(&url).await {
        Ok(_) => ProbeOutcome::Healthy,
        Err(e) => ProbeOutcome::Unhealthy {
            reason: e.to_string(),
        },
    }
}
