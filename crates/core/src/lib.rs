pub mod config;
pub mod definition;
pub mod extract;
pub mod fetch;
pub mod probe;
pub mod rows;
pub mod search;
pub mod template;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, FetchConfig,
    RelayConfig, SearchConfig,
};
pub use definition::{validate, DefinitionError, IndexerDefinition, SelectorRule};
pub use fetch::{DirectFetcher, FetchError, Fetcher, RelayFetcher};
pub use probe::{probe, ProbeOutcome};
pub use rows::{parse_rows, resolve_download_link, Candidate, ParseError};
pub use search::{SearchEngine, SearchError, SearchReport, Selection};
pub use template::TemplateError;
