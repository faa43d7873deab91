//! Value types for declarative indexer definitions.
//!
//! A definition describes how to query and scrape one torrent-listing site:
//! base links, search-path templates, a row locator, and per-field CSS
//! selector rules. Definitions are pure data; all behavior lives in the
//! template, extract, rows, probe and search modules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings field type that marks a definition as requiring the anti-bot
/// relay fetch path.
pub const RELAY_SETTING_TYPE: &str = "info_flaresolverr";

/// One per site: everything the interpreter needs to search and scrape it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerDefinition {
    /// Stable identifier (used as `Candidate::indexer`).
    pub id: String,
    /// Display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Site type as declared by the definition (public, private, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Base links; the first entry is the one used for fetching and for
    /// resolving relative download references.
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legacy_links: Vec<String>,
    #[serde(default)]
    pub follow_redirect: bool,
    #[serde(default)]
    pub caps: Caps,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<SettingsField>,
    /// Login block. Modeled because real definitions carry it, but the
    /// interpreter only implements the unauthenticated path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<LoginBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchBlock>,
    /// How to resolve a magnet/torrent link from a details page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<DownloadRule>,
}

impl IndexerDefinition {
    /// First base link with any trailing slash trimmed, or `None` when the
    /// definition declares no links at all.
    pub fn base_link(&self) -> Option<&str> {
        self.links.first().map(|l| l.trim_end_matches('/'))
    }

    /// Whether fetches for this definition must go through the anti-bot
    /// relay instead of a direct GET.
    pub fn uses_relay(&self) -> bool {
        self.settings
            .iter()
            .any(|s| s.field_type == RELAY_SETTING_TYPE)
    }

    /// Template bindings derived from the declared settings defaults.
    pub fn config_values(&self) -> BTreeMap<String, String> {
        self.settings
            .iter()
            .filter_map(|s| s.default.as_ref().map(|d| (s.name.clone(), d.clone())))
            .collect()
    }

    /// First declared search path, if any.
    pub fn first_search_path(&self) -> Option<&SearchPath> {
        self.search.as_ref().and_then(|s| s.paths.first())
    }
}

/// Declared search capabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Caps {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_mappings: Vec<CategoryMapping>,
    #[serde(default)]
    pub modes: SearchModes,
    #[serde(default)]
    pub allow_raw_search: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub id: String,
    pub cat: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default)]
    pub default: bool,
}

/// Supported query modes per search flavor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchModes {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tv_search: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub movie_search: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub music_search: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub book_search: Vec<String>,
}

/// A site-specific configuration knob declared by the definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// Login block, carried through from the definition format but not
/// interpreted (authenticated sessions are a future extension).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha: Option<CaptchaBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaBlock {
    #[serde(rename = "type")]
    pub captcha_type: String,
    pub selector: String,
    pub input: String,
}

/// How to search the site: path templates, the row locator and per-field
/// extraction rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchBlock {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<SearchPath>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords_filters: Vec<FilterBlock>,
    #[serde(default)]
    pub rows: RowsRule,
    /// Field name (`title`, `download`, `size`, `seeders`, ...) to
    /// extraction rule. Open-ended on purpose: sites declare arbitrary
    /// extra fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, SelectorRule>,
}

/// A URL path template plus its applicability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPath {
    pub path: String,
    /// HTTP method; only GET is executed by the current interpreter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub follow_redirect: bool,
}

/// How to locate repeated result rows in a results document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowsRule {
    pub selector: String,
    /// Skip this many leading matches (header rows).
    #[serde(default)]
    pub after: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<SelectorRule>,
}

/// A leaf extraction instruction: CSS query, optional attribute, default,
/// value remapping and an ordered filter chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorRule {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Exact-match override table; a miss leaves the value unchanged.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub case: BTreeMap<String, String>,
    /// Substring stripped from the extracted value before filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterBlock>,
}

/// Named filter operation as it appears in a definition. Resolved against
/// the closed [`FilterOp`](crate::extract::FilterOp) catalog when applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterBlock {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Ordered selector rules tried against a details page to find the actual
/// magnet/torrent link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selectors: Vec<SelectorRule>,
}
