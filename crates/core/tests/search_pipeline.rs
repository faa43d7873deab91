//! Search pipeline integration tests.
//!
//! These tests drive the full interpreter path from JSON definitions with
//! mocked fetch transports:
//! - definition -> template -> fetch -> row parse -> rank -> select
//! - graceful degradation of failing indexers
//! - relay-path definitions and probing

use std::sync::Arc;
use std::time::Duration;

use magnetar_core::{
    definition::{IndexerDefinition, SettingsField, RELAY_SETTING_TYPE},
    search::{SearchEngine, Selection},
    testing::MockFetcher,
    validate, SearchConfig,
};

/// A site with kebab-separated keywords in the path, a header row to skip
/// and comma-grouped seeder counts.
fn linuxbay() -> IndexerDefinition {
    let def: IndexerDefinition = serde_json::from_str(
        r#"{
            "id": "linuxbay",
            "name": "LinuxBay",
            "indexer_type": "public",
            "links": ["https://linuxbay.example/"],
            "search": {
                "paths": [{"path": "/find/{{ re_replace .Keywords \"%20\" \"-\" }}/page/0"}],
                "rows": {"selector": "table#results tr.entry", "after": 1},
                "fields": {
                    "title": {"selector": "td.name a"},
                    "download": {"selector": "td.links a.magnet", "attribute": "href"},
                    "size": {"selector": "td.size"},
                    "seeders": {
                        "selector": "td.se",
                        "filters": [{"name": "replace", "args": [",", ""]}]
                    },
                    "leechers": {"selector": "td.le"}
                }
            }
        }"#,
    )
    .unwrap();
    validate(&def).unwrap();
    def
}

fn linuxbay_page() -> &'static str {
    r#"<html><body><table id="results">
    <tr class="entry"><th>Name</th><th>Links</th></tr>
    <tr class="entry">
        <td class="name"><a href="/t/1">Debian 12 netinst</a></td>
        <td class="links"><a class="magnet" href="magnet:?xt=urn:btih:d12">m</a></td>
        <td class="size">0.6 GB</td><td class="se">1,204</td><td class="le">37</td>
    </tr>
    <tr class="entry">
        <td class="name"><a href="/t/2">Debian 12 DVD</a></td>
        <td class="links"><a class="magnet" href="/get/2.torrent">dl</a></td>
        <td class="size">4.7 GB</td><td class="se">88</td><td class="le">12</td>
    </tr>
    </table></body></html>"#
}

/// A site using config placeholders and relative torrent links.
fn isotracker() -> IndexerDefinition {
    let def: IndexerDefinition = serde_json::from_str(
        r#"{
            "id": "isotracker",
            "name": "ISO Tracker",
            "links": ["https://isotracker.example"],
            "settings": [
                {"name": "sort", "type": "select", "default": "seeders"}
            ],
            "search": {
                "paths": [{"path": "/browse?q={{ .Keywords }}&sort={{ .Config.sort }}&user={{ .Config.username }}"}],
                "rows": {"selector": "div.result"},
                "fields": {
                    "title": {"selector": "h3"},
                    "download": {"selector": "a.dl"},
                    "seeders": {"selector": "span.s", "default": "0"},
                    "leechers": {"selector": "span.l", "default": "0"}
                }
            }
        }"#,
    )
    .unwrap();
    validate(&def).unwrap();
    def
}

fn isotracker_page() -> &'static str {
    r#"<html><body>
    <div class="result">
        <h3>Debian 12 live</h3>
        <a class="dl" href="files/debian-live.torrent">get</a>
        <span class="s">230</span><span class="l">4</span>
    </div>
    <div class="result">
        <h3></h3>
        <a class="dl" href="files/broken.torrent">get</a>
        <span class="s">999</span>
    </div>
    </body></html>"#
}

fn engine(fetcher: Arc<MockFetcher>) -> SearchEngine {
    SearchEngine::with_fetchers(fetcher, None, SearchConfig::default())
}

#[tokio::test]
async fn test_two_sites_merge_rank_and_select() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher
        .respond(
            "https://linuxbay.example/find/debian-12/page/0",
            linuxbay_page(),
        )
        .await;
    fetcher
        .respond(
            "https://isotracker.example/browse?q=debian%2012&sort=seeders&user=guest",
            isotracker_page(),
        )
        .await;

    let defs = vec![linuxbay(), isotracker()];
    let report = engine(fetcher)
        .search(&defs, "debian 12", 0, None)
        .await
        .unwrap();

    // Titleless isotracker row is gated out; 3 candidates survive.
    assert_eq!(report.results_found, 3);
    assert!(report.indexer_errors.is_empty());

    match report.selection {
        Selection::Selected { best, ranked } => {
            // Comma filter made 1,204 parseable.
            assert_eq!(best.title, "Debian 12 netinst");
            assert_eq!(best.seeders, 1204);
            assert_eq!(ranked.len(), 3);
            assert_eq!(ranked[1].title, "Debian 12 live");
            assert_eq!(ranked[1].seeders, 230);
            // Relative links resolved with a single separating slash.
            assert_eq!(
                ranked[1].magnet,
                "https://isotracker.example/files/debian-live.torrent"
            );
            assert_eq!(
                ranked[2].magnet,
                "https://linuxbay.example/get/2.torrent"
            );
        }
        other => panic!("unexpected selection: {other:?}"),
    }
}

#[tokio::test]
async fn test_failing_site_contributes_nothing_but_is_reported() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher
        .respond(
            "https://linuxbay.example/find/debian-12/page/0",
            linuxbay_page(),
        )
        .await;
    fetcher
        .fail(
            "https://isotracker.example/browse?q=debian%2012&sort=seeders&user=guest",
            "connection refused",
        )
        .await;

    let defs = vec![linuxbay(), isotracker()];
    let report = engine(fetcher)
        .search(&defs, "debian 12", 0, None)
        .await
        .unwrap();

    assert_eq!(report.results_found, 2);
    assert_eq!(report.indexer_errors.len(), 1);
    assert!(report.indexer_errors["isotracker"].contains("connection refused"));
    match report.selection {
        Selection::Selected { best, .. } => assert_eq!(best.seeders, 1204),
        other => panic!("unexpected selection: {other:?}"),
    }
}

#[tokio::test]
async fn test_threshold_not_met_reports_true_count() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher
        .respond(
            "https://linuxbay.example/find/rare-distro/page/0",
            &linuxbay_page()
                .replace("1,204", "3")
                .replace(">88<", ">1<"),
        )
        .await;

    let report = engine(fetcher)
        .search(&[linuxbay()], "rare distro", 50, None)
        .await
        .unwrap();

    assert!(matches!(report.selection, Selection::ThresholdNotMet));
    assert_eq!(report.results_found, 2);
}

#[tokio::test]
async fn test_selected_candidate_always_meets_threshold() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher
        .respond(
            "https://linuxbay.example/find/debian-12/page/0",
            linuxbay_page(),
        )
        .await;

    let report = engine(fetcher)
        .search(&[linuxbay()], "debian 12", 100, None)
        .await
        .unwrap();

    match report.selection {
        Selection::Selected { best, .. } => assert!(best.seeders >= 100),
        other => panic!("unexpected selection: {other:?}"),
    }
}

#[tokio::test]
async fn test_relay_definition_round_trip() {
    let direct = Arc::new(MockFetcher::new());
    let relay = Arc::new(MockFetcher::new());
    relay
        .respond(
            "https://guarded.example/find/debian-12/page/0",
            linuxbay_page(),
        )
        .await;

    let mut def = linuxbay();
    def.id = "guarded".to_string();
    def.links = vec!["https://guarded.example".to_string()];
    def.settings.push(SettingsField {
        name: "flaresolverr".to_string(),
        label: None,
        field_type: RELAY_SETTING_TYPE.to_string(),
        default: None,
        options: Default::default(),
    });

    let engine =
        SearchEngine::with_fetchers(direct.clone(), Some(relay.clone()), SearchConfig::default());
    let report = engine.search(&[def], "debian 12", 0, None).await.unwrap();

    assert_eq!(report.results_found, 2);
    assert!(direct.fetched().await.is_empty());
    assert_eq!(relay.fetched().await.len(), 1);
}

#[tokio::test]
async fn test_probe_uses_empty_keywords_and_config_defaults() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher
        .respond(
            "https://isotracker.example/browse?q=&sort=seeders&user=guest",
            "<html></html>",
        )
        .await;

    let engine = engine(fetcher.clone());
    let outcome = engine.probe(&isotracker()).await;
    assert!(outcome.is_healthy());
    assert_eq!(
        fetcher.fetched().await,
        vec!["https://isotracker.example/browse?q=&sort=seeders&user=guest".to_string()]
    );
}

#[tokio::test]
async fn test_slow_site_does_not_stall_fast_site() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher
        .respond(
            "https://linuxbay.example/find/debian-12/page/0",
            linuxbay_page(),
        )
        .await;
    fetcher
        .hang("https://isotracker.example/browse?q=debian%2012&sort=seeders&user=guest")
        .await;

    let defs = vec![linuxbay(), isotracker()];
    let report = engine(fetcher)
        .search(&defs, "debian 12", 0, Some(Duration::from_millis(250)))
        .await
        .unwrap();

    assert_eq!(report.results_found, 2);
    assert!(report.indexer_errors["isotracker"].contains("deadline"));
}
