//! Declarative indexer definitions: value types and structural validation.

mod types;
mod validate;

pub use types::*;
pub use validate::validate;

use thiserror::Error;

/// Malformed or incomplete indexer definition. Fatal for that definition
/// only; never retried.
#[derive(Debug, Clone, Error)]
pub enum DefinitionError {
    #[error("indexer {indexer} declares no base links")]
    MissingLinks { indexer: String },

    #[error("indexer {indexer} has no search block")]
    MissingSearchBlock { indexer: String },

    #[error("indexer {indexer} has no row selector")]
    MissingRowSelector { indexer: String },

    #[error("indexer {indexer} field {field} is malformed: {reason}")]
    MalformedField {
        indexer: String,
        field: String,
        reason: String,
    },
}
