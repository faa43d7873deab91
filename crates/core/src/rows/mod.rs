//! Result-row parser.
//!
//! Locates repeated result rows in a search-results document, runs the
//! extraction engine per declared field, resolves relative download
//! references against the indexer's base link and emits validated
//! [`Candidate`] records. A row missing a title or a download reference is
//! silently dropped; an empty output list is a valid "no results" outcome,
//! distinct from a parse failure.

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::definition::{DefinitionError, DownloadRule, IndexerDefinition, SelectorRule};
use crate::extract::extract;
use crate::template::join_url;

/// A normalized, validated release extracted from one result row.
/// Immutable once returned; the parser keeps no reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Release title, always non-empty.
    pub title: String,
    /// Absolute download reference: `magnet:` URI or absolute URL.
    pub magnet: String,
    /// Free-form size as reported by the site ("2.5 GB").
    #[serde(default)]
    pub size: String,
    pub seeders: u32,
    pub leechers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Identifier of the definition that produced this candidate.
    pub indexer: String,
}

/// Document-level parse failure. Aborts extraction for this document only,
/// never the whole aggregated search.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document could not be parsed: {reason}")]
    Unreadable { reason: String },

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("download link not found in details page")]
    DownloadLinkNotFound,
}

/// Parse a search-results document into candidates, in document order.
pub fn parse_rows(html: &str, def: &IndexerDefinition) -> Result<Vec<Candidate>, ParseError> {
    let search = def
        .search
        .as_ref()
        .ok_or_else(|| DefinitionError::MissingSearchBlock {
            indexer: def.id.clone(),
        })?;
    if search.rows.selector.trim().is_empty() {
        return Err(DefinitionError::MissingRowSelector {
            indexer: def.id.clone(),
        }
        .into());
    }
    let base = def
        .base_link()
        .ok_or_else(|| DefinitionError::MissingLinks {
            indexer: def.id.clone(),
        })?
        .to_string();

    let row_selector =
        Selector::parse(&search.rows.selector).map_err(|e| ParseError::Unreadable {
            reason: format!("row selector {:?}: {e}", search.rows.selector),
        })?;

    let doc = Html::parse_document(html);

    let mut candidates = Vec::new();
    let mut dropped = 0usize;
    for row in doc.select(&row_selector).skip(search.rows.after) {
        let mut candidate = Candidate {
            title: String::new(),
            magnet: String::new(),
            size: String::new(),
            seeders: 0,
            leechers: 0,
            published_at: None,
            indexer: def.id.clone(),
        };

        for (field, rule) in &search.fields {
            match field.as_str() {
                "title" => candidate.title = extract(row, rule),
                "download" => {
                    // A download reference is always an attribute; default
                    // to href when the rule does not name one.
                    let value = extract(row, &with_default_attribute(rule));
                    candidate.magnet = resolve_reference(&value, &base);
                }
                "size" => candidate.size = extract(row, rule),
                "seeders" => candidate.seeders = parse_count(&extract(row, rule)),
                "leechers" => candidate.leechers = parse_count(&extract(row, rule)),
                "date" => candidate.published_at = parse_publish_date(&extract(row, rule)),
                other => {
                    // Future fields are extracted (exercising the rule for
                    // diagnostics) but not yet mapped onto the candidate.
                    let _ = extract(row, rule);
                    debug!(indexer = %def.id, field = other, "unmapped field in definition");
                }
            }
        }

        // Validity gate: no title or no resolved download reference means
        // the row is unusable, not an error.
        if candidate.title.is_empty() || candidate.magnet.is_empty() {
            dropped += 1;
            continue;
        }
        candidates.push(candidate);
    }

    debug!(
        indexer = %def.id,
        rows = candidates.len(),
        dropped = dropped,
        "parsed result rows"
    );
    Ok(candidates)
}

/// Resolve a magnet/torrent link from a details page by trying the download
/// rule's selectors in declared order.
pub fn resolve_download_link(
    html: &str,
    rule: &DownloadRule,
    base: &str,
) -> Result<String, ParseError> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    for selector_rule in &rule.selectors {
        let value = extract(root, &with_default_attribute(selector_rule));
        if !value.is_empty() {
            return Ok(resolve_reference(&value, base));
        }
    }

    Err(ParseError::DownloadLinkNotFound)
}

fn with_default_attribute(rule: &SelectorRule) -> SelectorRule {
    let mut rule = rule.clone();
    if rule.attribute.is_none() {
        rule.attribute = Some("href".to_string());
    }
    rule
}

/// Rewrite a relative reference onto the base link; absolute URIs
/// (including `magnet:`) pass through untouched.
fn resolve_reference(value: &str, base: &str) -> String {
    if value.is_empty() || url::Url::parse(value).is_ok() {
        return value.to_string();
    }
    join_url(base, value)
}

/// Numeric cell parse: trim then integer, degrading to 0 on failure so a
/// single malformed cell cannot invalidate the whole row.
fn parse_count(value: &str) -> u32 {
    value.trim().parse().unwrap_or_else(|_| {
        if !value.trim().is_empty() {
            warn!(value = %value, "unparsable numeric cell, defaulting to 0");
        }
        0
    })
}

/// Publish dates come in site-specific shapes; RFC 3339 first, then a naive
/// timestamp without zone.
fn parse_publish_date(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::validate;
    use chrono::Datelike;

    const ROW_HTML: &str = r#"
        <html><body><table>
        <tr class="result">
            <td class="title">Ubuntu 22.04 ISO</td>
            <td><a class="dl" href="magnet:?xt=urn:btih:abc">dl</a></td>
            <td class="size">2.5 GB</td>
            <td class="seeds">100</td>
            <td class="peers">10</td>
        </tr>
        </table></body></html>
    "#;

    fn definition() -> IndexerDefinition {
        let def: IndexerDefinition = serde_json::from_str(
            r#"{
                "id": "example",
                "name": "Example",
                "links": ["https://example.com"],
                "search": {
                    "paths": [{"path": "/search/{{ .Keywords }}"}],
                    "rows": {"selector": "tr.result"},
                    "fields": {
                        "title": {"selector": ".title"},
                        "download": {"selector": "a.dl", "attribute": "href"},
                        "size": {"selector": ".size"},
                        "seeders": {"selector": ".seeds"},
                        "leechers": {"selector": ".peers"}
                    }
                }
            }"#,
        )
        .unwrap();
        validate(&def).unwrap();
        def
    }

    #[test]
    fn test_parse_single_row() {
        let candidates = parse_rows(ROW_HTML, &definition()).unwrap();
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.title, "Ubuntu 22.04 ISO");
        assert_eq!(c.magnet, "magnet:?xt=urn:btih:abc");
        assert_eq!(c.size, "2.5 GB");
        assert_eq!(c.seeders, 100);
        assert_eq!(c.leechers, 10);
        assert_eq!(c.indexer, "example");
    }

    #[test]
    fn test_relative_download_resolved_against_base() {
        let html = ROW_HTML.replace("magnet:?xt=urn:btih:abc", "/download/x.torrent");
        let candidates = parse_rows(&html, &definition()).unwrap();
        assert_eq!(
            candidates[0].magnet,
            "https://example.com/download/x.torrent"
        );
    }

    #[test]
    fn test_relative_download_without_leading_slash() {
        let html = ROW_HTML.replace("magnet:?xt=urn:btih:abc", "download/x.torrent");
        let candidates = parse_rows(&html, &definition()).unwrap();
        assert_eq!(
            candidates[0].magnet,
            "https://example.com/download/x.torrent"
        );
    }

    #[test]
    fn test_absolute_download_passes_through() {
        let html = ROW_HTML.replace(
            "magnet:?xt=urn:btih:abc",
            "https://mirror.example.org/x.torrent",
        );
        let candidates = parse_rows(&html, &definition()).unwrap();
        assert_eq!(candidates[0].magnet, "https://mirror.example.org/x.torrent");
    }

    #[test]
    fn test_row_without_title_is_dropped() {
        let html = ROW_HTML.replace("Ubuntu 22.04 ISO", "");
        let candidates = parse_rows(&html, &definition()).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_row_without_download_is_dropped() {
        let html = ROW_HTML.replace("href=\"magnet:?xt=urn:btih:abc\"", "");
        let candidates = parse_rows(&html, &definition()).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_no_matching_rows_is_empty_not_error() {
        let candidates = parse_rows("<html><body></body></html>", &definition()).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_missing_row_selector_short_circuits() {
        let mut def = definition();
        def.search.as_mut().unwrap().rows.selector = String::new();
        let err = parse_rows(ROW_HTML, &def).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Definition(DefinitionError::MissingRowSelector { .. })
        ));
    }

    #[test]
    fn test_missing_search_block_short_circuits() {
        let mut def = definition();
        def.search = None;
        let err = parse_rows(ROW_HTML, &def).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Definition(DefinitionError::MissingSearchBlock { .. })
        ));
    }

    #[test]
    fn test_unreadable_row_selector() {
        let mut def = definition();
        def.search.as_mut().unwrap().rows.selector = "tr:::bad".to_string();
        let err = parse_rows(ROW_HTML, &def).unwrap_err();
        assert!(matches!(err, ParseError::Unreadable { .. }));
    }

    #[test]
    fn test_malformed_seeders_default_to_zero() {
        let html = ROW_HTML.replace(
            "<td class=\"seeds\">100</td>",
            "<td class=\"seeds\">n/a</td>",
        );
        let candidates = parse_rows(&html, &definition()).unwrap();
        assert_eq!(candidates[0].seeders, 0);
        assert_eq!(candidates[0].leechers, 10);
    }

    #[test]
    fn test_rows_after_skips_header_rows() {
        let html = r#"
            <table>
            <tr class="result"><td class="title">Header</td></tr>
            <tr class="result">
                <td class="title">Real</td>
                <td><a class="dl" href="magnet:?xt=urn:btih:x">dl</a></td>
            </tr>
            </table>
        "#;
        let mut def = definition();
        def.search.as_mut().unwrap().rows.after = 1;
        let candidates = parse_rows(html, &def).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Real");
    }

    #[test]
    fn test_publish_date_field() {
        let html = ROW_HTML.replace(
            "<td class=\"size\">2.5 GB</td>",
            "<td class=\"size\">2.5 GB</td><td class=\"when\">2024-06-15T10:30:00Z</td>",
        );
        let mut def = definition();
        def.search.as_mut().unwrap().fields.insert(
            "date".to_string(),
            SelectorRule {
                selector: ".when".to_string(),
                ..SelectorRule::default()
            },
        );
        let candidates = parse_rows(&html, &def).unwrap();
        let published = candidates[0].published_at.unwrap();
        assert_eq!(published.year(), 2024);
        assert_eq!(published.month(), 6);
    }

    #[test]
    fn test_resolve_download_link_first_selector_wins() {
        let html = r#"
            <html><body>
            <a id="torrent" href="/dl/x.torrent">torrent</a>
            <a id="magnet" href="magnet:?xt=urn:btih:y">magnet</a>
            </body></html>
        "#;
        let rule: DownloadRule = serde_json::from_str(
            r#"{"selectors": [
                {"selector": "a#magnet"},
                {"selector": "a#torrent"}
            ]}"#,
        )
        .unwrap();
        let link = resolve_download_link(html, &rule, "https://example.com").unwrap();
        assert_eq!(link, "magnet:?xt=urn:btih:y");
    }

    #[test]
    fn test_resolve_download_link_falls_through_and_resolves_relative() {
        let html = r#"<html><body><a id="torrent" href="/dl/x.torrent">t</a></body></html>"#;
        let rule: DownloadRule = serde_json::from_str(
            r#"{"selectors": [
                {"selector": "a#magnet"},
                {"selector": "a#torrent"}
            ]}"#,
        )
        .unwrap();
        let link = resolve_download_link(html, &rule, "https://example.com/").unwrap();
        assert_eq!(link, "https://example.com/dl/x.torrent");
    }

    #[test]
    fn test_resolve_download_link_not_found() {
        let rule: DownloadRule =
            serde_json::from_str(r#"{"selectors": [{"selector": "a#magnet"}]}"#).unwrap();
        let err = resolve_download_link("<html></html>", &rule, "https://example.com").unwrap_err();
        assert!(matches!(err, ParseError::DownloadLinkNotFound));
    }
}
