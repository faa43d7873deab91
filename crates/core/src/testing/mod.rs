//! Test support: mock fetch paths and definition fixtures.
//!
//! Used by unit tests and the integration suite; not part of the public
//! search/probe contract.

mod mock_fetcher;

pub use mock_fetcher::MockFetcher;

use crate::definition::IndexerDefinition;

/// A minimal valid definition for a fictional site, with the usual five
/// fields and a keyword search path.
pub fn example_definition(id: &str, base: &str) -> IndexerDefinition {
    serde_json::from_str(&format!(
        r#"{{
            "id": "{id}",
            "name": "{id}",
            "links": ["{base}"],
            "search": {{
                "paths": [{{"path": "/search?q={{{{ .Keywords }}}}"}}],
                "rows": {{"selector": "tr.result"}},
                "fields": {{
                    "title": {{"selector": ".title"}},
                    "download": {{"selector": "a.dl", "attribute": "href"}},
                    "size": {{"selector": ".size"}},
                    "seeders": {{"selector": ".seeds"}},
                    "leechers": {{"selector": ".peers"}}
                }}
            }}
        }}"#
    ))
    .expect("fixture definition is valid JSON")
}

/// Render one result row matching [`example_definition`]'s selectors.
pub fn result_row(title: &str, href: &str, seeders: u32, leechers: u32) -> String {
    format!(
        r#"<tr class="result">
            <td class="title">{title}</td>
            <td><a class="dl" href="{href}">dl</a></td>
            <td class="size">1.2 GB</td>
            <td class="seeds">{seeders}</td>
            <td class="peers">{leechers}</td>
        </tr>"#
    )
}

/// Wrap rows into a full results page.
pub fn results_page(rows: &[String]) -> String {
    format!(
        "<html><body><table>{}</table></body></html>",
        rows.join("\n")
    )
}
