use serde_json::json;
use vnstockalert::{
    config::split_symbols,
    models::{normalize_symbol, parse_target},
    services::{observers_service::normalize_observers, sample_feed::SampleFeed},
};

#[test]
fn normalize_observers_cleans_keys_and_values() {
    let body = json!({
        " vcb ": " 95,000 ",
        "fpt": 120000,
        "tcb": true,
        "hpg": null,
        "  ": "1"
    });
    let out = normalize_observers(&body);

    assert_eq!(out.len(), 3);
    assert_eq!(out["VCB"], "95,000");
    assert_eq!(out["FPT"], "120000");
    assert_eq!(out["TCB"], "true");
}

#[test]
fn non_object_bodies_mean_no_observers() {
    assert!(normalize_observers(&json!(["VCB"])).is_empty());
    assert!(normalize_observers(&json!("VCB")).is_empty());
    assert!(normalize_observers(&json!(null)).is_empty());
}

#[test]
fn parse_target_tolerates_separators() {
    assert_eq!(parse_target("95,000"), Some(95000.0));
    assert_eq!(parse_target(" 1 250.5 "), Some(1250.5));
    assert_eq!(parse_target(""), None);
    assert_eq!(parse_target("abc"), None);
    assert_eq!(parse_target("inf"), None);
    assert_eq!(normalize_symbol(" vcb "), "VCB");
}

#[test]
fn split_symbols_drops_blanks() {
    assert_eq!(split_symbols("CTG, VIB,,  ,FPT "), vec!["CTG", "VIB", "FPT"]);
    assert!(split_symbols("").is_empty());
}

#[tokio::test]
async fn sample_feed_stays_in_range_and_holds_between_rotations() {
    let feed = SampleFeed::new(35_000, 40_000, std::time::Duration::from_secs(3600));
    let first = feed.price();
    assert!((35_000.0..=40_000.0).contains(&first));
    assert_eq!(feed.price(), first);

    let pinned = SampleFeed::new(37_000, 37_000, std::time::Duration::ZERO);
    assert_eq!(pinned.price(), 37_000.0);
}
