//! Structural validation for indexer definitions.
//!
//! Every other component only accepts validated definitions: a definition
//! usable for search must have at least one base link and a non-empty row
//! locator, and every declared field selector must compile. Absence of any
//! of these is a definition error, not a runtime fault.

use scraper::Selector;

use super::types::IndexerDefinition;
use super::DefinitionError;

/// Validate a definition for use by the search and probe paths.
pub fn validate(def: &IndexerDefinition) -> Result<(), DefinitionError> {
    if def.links.is_empty() || def.links.iter().all(|l| l.trim().is_empty()) {
        return Err(DefinitionError::MissingLinks {
            indexer: def.id.clone(),
        });
    }

    let search = def
        .search
        .as_ref()
        .ok_or_else(|| DefinitionError::MissingSearchBlock {
            indexer: def.id.clone(),
        })?;

    if search.rows.selector.trim().is_empty() {
        return Err(DefinitionError::MissingRowSelector {
            indexer: def.id.clone(),
        });
    }

    if Selector::parse(&search.rows.selector).is_err() {
        return Err(DefinitionError::MalformedField {
            indexer: def.id.clone(),
            field: "rows".to_string(),
            reason: format!("invalid row selector {:?}", search.rows.selector),
        });
    }

    for (field, rule) in &search.fields {
        if rule.selector.trim().is_empty() {
            // An empty selector means "always use the default"; legal.
            continue;
        }
        if Selector::parse(&rule.selector).is_err() {
            return Err(DefinitionError::MalformedField {
                indexer: def.id.clone(),
                field: field.clone(),
                reason: format!("invalid selector {:?}", rule.selector),
            });
        }
    }

    Ok(())
}
