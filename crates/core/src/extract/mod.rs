//! Selector extraction engine.
//!
//! Evaluates one [`SelectorRule`] against a document fragment: CSS query,
//! optional attribute read, default value, `case` remapping and an ordered
//! filter chain. Extraction is a pure function of the fragment and never
//! errors on absent data; malformed pieces of untrusted site definitions
//! degrade to the rule's default (with a warning) instead of aborting a
//! whole search.

use scraper::{ElementRef, Selector};
use tracing::warn;

use crate::definition::{FilterBlock, SelectorRule};

/// Closed catalog of filter operations. Definitions name filters as free
/// strings; unknown names are a logged no-op rather than a hard failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOp {
    ReReplace { pattern: String, replacement: String },
    Replace { from: String, to: String },
    Trim,
    Append(String),
    Prepend(String),
    ToLower,
    ToUpper,
}

impl FilterOp {
    /// Resolve a named filter block to a catalog operation. `None` means the
    /// name is unknown or its arguments are incomplete.
    pub fn from_block(block: &FilterBlock) -> Option<Self> {
        match block.name.as_str() {
            "re_replace" => Some(Self::ReReplace {
                pattern: block.args.first()?.clone(),
                replacement: block.args.get(1)?.clone(),
            }),
            "replace" => Some(Self::Replace {
                from: block.args.first()?.clone(),
                to: block.args.get(1)?.clone(),
            }),
            "trim" => Some(Self::Trim),
            "append" => Some(Self::Append(block.args.first()?.clone())),
            "prepend" => Some(Self::Prepend(block.args.first()?.clone())),
            "tolower" => Some(Self::ToLower),
            "toupper" => Some(Self::ToUpper),
            _ => None,
        }
    }

    /// Apply this operation to a value.
    pub fn apply(&self, value: String) -> String {
        match self {
            Self::ReReplace {
                pattern,
                replacement,
            } => match regex_lite::Regex::new(pattern) {
                Ok(re) => re.replace_all(&value, replacement.as_str()).into_owned(),
                Err(_) => {
                    warn!(pattern = %pattern, "invalid re_replace pattern, skipping filter");
                    value
                }
            },
            Self::Replace { from, to } => value.replace(from, to),
            Self::Trim => value.trim().to_string(),
            Self::Append(suffix) => value + suffix,
            Self::Prepend(prefix) => format!("{prefix}{value}"),
            Self::ToLower => value.to_lowercase(),
            Self::ToUpper => value.to_uppercase(),
        }
    }
}

/// Evaluate an extraction rule against a fragment, returning the extracted
/// string (the rule default when nothing matches).
pub fn extract(fragment: ElementRef<'_>, rule: &SelectorRule) -> String {
    let raw = match query_fragment(fragment, rule) {
        Some(value) => value,
        None => rule_default(rule),
    };

    let remapped = match rule.case.get(&raw) {
        Some(mapped) => mapped.clone(),
        None => raw,
    };

    let stripped = match &rule.remove {
        Some(needle) if !needle.is_empty() => remapped.replace(needle.as_str(), ""),
        _ => remapped,
    };

    apply_filters(stripped, &rule.filters)
}

/// Run a filter chain in declared order. Unknown filter names are skipped
/// with a warning.
pub fn apply_filters(value: String, filters: &[FilterBlock]) -> String {
    filters
        .iter()
        .fold(value, |acc, block| match FilterOp::from_block(block) {
            Some(op) => op.apply(acc),
            None => {
                warn!(filter = %block.name, "unknown or incomplete filter, skipping");
                acc
            }
        })
}

fn query_fragment(fragment: ElementRef<'_>, rule: &SelectorRule) -> Option<String> {
    if rule.selector.trim().is_empty() {
        return None;
    }
    let selector = match Selector::parse(&rule.selector) {
        Ok(s) => s,
        Err(_) => {
            // Definitions are validated up front, but a rule reached through
            // an unvalidated path still degrades instead of panicking.
            warn!(selector = %rule.selector, "unparsable selector, using default");
            return None;
        }
    };

    let element = fragment.select(&selector).next()?;
    match &rule.attribute {
        Some(attr) => element.value().attr(attr).map(str::to_string),
        None => Some(element.text().collect::<String>().trim().to_string()),
    }
}

fn rule_default(rule: &SelectorRule) -> String {
    rule.default.clone().unwrap_or_default()
}
