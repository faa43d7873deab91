//! Search aggregator and ranker.
//!
//! Fans a keyword query out across a set of indexer definitions, merges the
//! candidates, ranks by seeders and selects the best one under a
//! minimum-seeders threshold. Per-definition failures are recorded and
//! isolated; only an empty definition set fails the search itself.
//!
//! Ranking reproducibility: the fan-out runs with bounded concurrency but
//! per-definition results are reassembled in input order before the stable
//! sort, so ties keep definition input order and document order within a
//! definition regardless of completion order.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, SearchConfig};
use crate::definition::{DefinitionError, IndexerDefinition};
use crate::fetch::{DirectFetcher, FetchError, Fetcher, RelayFetcher};
use crate::probe::{self, ProbeOutcome};
use crate::rows::{parse_rows, Candidate};
use crate::template::build_search_url;

/// Caller-level search failure. Per-definition failures are never raised
/// this way; they are reported in [`SearchReport::indexer_errors`].
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no indexer definitions supplied")]
    NoIndexers,
}

/// The aggregator's output: one of three distinct outcomes plus per-indexer
/// diagnostics. Recomputed on every invocation, never cached.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub selection: Selection,
    /// Total merged candidates before selection; preserved even when no
    /// candidate met the threshold.
    pub results_found: usize,
    /// Failed definitions (id -> reason). Absent from the candidate tally
    /// but never silently dropped from diagnostics.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub indexer_errors: HashMap<String, String>,
    pub duration_ms: u64,
}

/// Outcome of candidate selection. "No results", "results found but none
/// qualified" and a successful pick are deliberately distinct.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Selection {
    Selected {
        best: Candidate,
        /// Full list ranked by seeders descending.
        ranked: Vec<Candidate>,
    },
    NoResults,
    ThresholdNotMet,
}

/// Executes searches and probes against indexer definitions, choosing the
/// direct or relay fetch path per definition.
pub struct SearchEngine {
    direct: Arc<dyn Fetcher>,
    relay: Option<Arc<dyn Fetcher>>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(config: &Config) -> Self {
        let relay = config
            .relay
            .as_ref()
            .map(|r| Arc::new(RelayFetcher::new(r, config.fetch.timeout_secs)) as Arc<dyn Fetcher>);
        Self {
            direct: Arc::new(DirectFetcher::new(&config.fetch)),
            relay,
            config: config.search.clone(),
        }
    }

    /// Construct with explicit fetch paths. Test seam, also useful for
    /// callers bringing their own transport.
    pub fn with_fetchers(
        direct: Arc<dyn Fetcher>,
        relay: Option<Arc<dyn Fetcher>>,
        config: SearchConfig,
    ) -> Self {
        Self {
            direct,
            relay,
            config,
        }
    }

    /// Fan the keyword query out to every definition, merge, rank and
    /// select under `min_seeders`. `deadline` bounds the whole operation
    /// (config default when `None`) and is propagated as cancellation into
    /// in-flight fetches; a cancelled definition contributes no candidates,
    /// same as a failed one.
    pub async fn search(
        &self,
        definitions: &[IndexerDefinition],
        keywords: &str,
        min_seeders: u32,
        deadline: Option<Duration>,
    ) -> Result<SearchReport, SearchError> {
        if definitions.is_empty() {
            return Err(SearchError::NoIndexers);
        }

        let start = Instant::now();
        let deadline = tokio::time::Instant::now()
            + deadline.unwrap_or(Duration::from_secs(self.config.deadline_secs));

        debug!(
            indexers = definitions.len(),
            keywords = keywords,
            min_seeders = min_seeders,
            "starting aggregated search"
        );

        // buffered() yields in input order, which reassembles partial
        // results in definition-input order regardless of completion order.
        let per_indexer: Vec<(String, Result<Vec<Candidate>, String>)> =
            stream::iter(definitions)
                .map(|def| async move {
                    let outcome =
                        match tokio::time::timeout_at(deadline, self.search_one(def, keywords))
                            .await
                        {
                            Ok(result) => result,
                            Err(_) => Err("cancelled: search deadline exceeded".to_string()),
                        };
                    (def.id.clone(), outcome)
                })
                .buffered(self.config.max_concurrent_indexers)
                .collect()
                .await;

        let mut merged: Vec<Candidate> = Vec::new();
        let mut indexer_errors: HashMap<String, String> = HashMap::new();
        for (indexer, outcome) in per_indexer {
            match outcome {
                Ok(mut candidates) => {
                    debug!(indexer = %indexer, count = candidates.len(), "indexer search complete");
                    merged.append(&mut candidates);
                }
                Err(reason) => {
                    warn!(indexer = %indexer, error = %reason, "indexer search failed");
                    indexer_errors.insert(indexer, reason);
                }
            }
        }

        let results_found = merged.len();

        // Stable sort: ties keep the merged order (input-definition order,
        // document order within a definition).
        merged.sort_by(|a, b| b.seeders.cmp(&a.seeders));

        let selection = if merged.is_empty() {
            Selection::NoResults
        } else if let Some(best) = merged.iter().find(|c| c.seeders >= min_seeders) {
            Selection::Selected {
                best: best.clone(),
                ranked: merged,
            }
        } else {
            Selection::ThresholdNotMet
        };

        Ok(SearchReport {
            selection,
            results_found,
            indexer_errors,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Probe a definition's endpoint through its preferred fetch path.
    pub async fn probe(&self, def: &IndexerDefinition) -> ProbeOutcome {
        match self.fetcher_for(def) {
            Ok(fetcher) => probe::probe(def, fetcher.as_ref()).await,
            Err(e) => ProbeOutcome::Unhealthy {
                reason: e.to_string(),
            },
        }
    }

    async fn search_one(
        &self,
        def: &IndexerDefinition,
        keywords: &str,
    ) -> Result<Vec<Candidate>, String> {
        let fetcher = self.fetcher_for(def).map_err(|e| e.to_string())?;
        let url = build_search_url(def, keywords).ok_or_else(|| {
            DefinitionError::MissingLinks {
                indexer: def.id.clone(),
            }
            .to_string()
        })?;

        debug!(indexer = %def.id, url = %url, path = fetcher.name(), "querying indexer");
        let body = fetcher.fetch(&url).await.map_err(|e| e.to_string())?;
        parse_rows(&body, def).map_err(|e| e.to_string())
    }

    fn fetcher_for(&self, def: &IndexerDefinition) -> Result<&Arc<dyn Fetcher>, FetchError> {
        if def.uses_relay() {
            self.relay.as_ref().ok_or(FetchError::RelayUnavailable)
        } else {
            Ok(&self.direct)
        }
    }
}
