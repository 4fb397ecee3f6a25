use std::{future::Future, sync::Mutex};

use tempfile::TempDir;
use vnstockalert::{
    config::SymbolPolicy,
    models::{AlertState, Observers, PriceMap},
    services::{
        alert_checker::{plan_cycle, AlertChecker, AlertRule, Hit},
        store::{FileStore, Store},
        telegram::Notify,
    },
};

struct Recorder {
    ok: bool,
    sent: Mutex<Vec<String>>,
}

impl Recorder {
    fn new(ok: bool) -> Self {
        Self {
            ok,
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notify for Recorder {
    fn send(&self, text: &str) -> impl Future<Output = bool> + Send {
        self.sent.lock().unwrap().push(text.to_string());
        let ok = self.ok;
        async move { ok }
    }
}

fn observers(pairs: &[(&str, &str)]) -> Observers {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn prices(pairs: &[(&str, f64)]) -> PriceMap {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn file_store() -> (Store, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    (Store::File(FileStore::new(dir.path(), 7)), dir)
}

#[test]
fn threshold_matches_at_or_below_target() {
    let rule = AlertRule::Threshold;
    for target in [1.0, 950.0, 95000.0] {
        assert!(rule.matches(target, target));
        assert!(rule.matches(target - 0.5, target));
        assert!(!rule.matches(target + 0.5, target));
    }
}

#[test]
fn band_is_strict_and_symmetric() {
    let rule = AlertRule::Band(0.001);
    // 100_000 +/- 100
    assert!(rule.matches(100_000.0, 100_000.0));
    assert!(rule.matches(99_901.0, 100_000.0));
    assert!(rule.matches(100_099.0, 100_000.0));
    assert!(!rule.matches(99_899.0, 100_000.0));
    assert!(!rule.matches(100_101.0, 100_000.0));
}

#[test]
fn threshold_message_names_symbol_price_and_target() {
    let hit = Hit {
        symbol: "VCB".into(),
        target: 95000.0,
        price: 94000.0,
    };
    assert_eq!(
        AlertRule::Threshold.message(&hit),
        "🔔 Price alert: VCB = 94,000 (target ≤ 95,000)"
    );
    assert!(AlertRule::Band(0.001).message(&hit).contains("of target 95,000"));
}

#[test]
fn plan_skips_missing_prices_and_bad_targets() {
    let obs = observers(&[("VCB", "95,000"), ("FPT", "abc"), ("TCB", ""), ("HPG", "30000")]);
    let px = prices(&[("VCB", 94000.0), ("FPT", 1.0), ("TCB", 1.0)]);

    let plan = plan_cycle(&obs, &px, &AlertState::new(), AlertRule::Threshold);

    assert_eq!(
        plan.hits,
        vec![Hit {
            symbol: "VCB".into(),
            target: 95000.0,
            price: 94000.0
        }]
    );
    assert!(plan.cleared.is_empty());
}

#[test]
fn plan_does_not_repeat_an_alert_for_the_same_target() {
    let obs = observers(&[("VCB", "95000")]);
    let state: AlertState = [("VCB".to_string(), 95000.0)].into_iter().collect();

    let plan = plan_cycle(&obs, &prices(&[("VCB", 94000.0)]), &state, AlertRule::Threshold);
    assert!(plan.hits.is_empty());
    assert!(plan.cleared.is_empty());

    // no price this cycle: state untouched
    let plan = plan_cycle(&obs, &PriceMap::new(), &state, AlertRule::Threshold);
    assert!(plan.cleared.is_empty());
}

#[test]
fn plan_clears_when_condition_target_or_observer_goes_away() {
    let state: AlertState = [("VCB".to_string(), 95000.0), ("FPT".to_string(), 120000.0)]
        .into_iter()
        .collect();

    let obs = observers(&[("VCB", "95000")]);
    let plan = plan_cycle(&obs, &prices(&[("VCB", 96000.0)]), &state, AlertRule::Threshold);
    assert!(plan.hits.is_empty());
    assert_eq!(plan.cleared, vec!["FPT".to_string(), "VCB".to_string()]);

    // target moved while the price still qualifies: re-alert at the new target
    let obs = observers(&[("VCB", "97000"), ("FPT", "120000")]);
    let plan = plan_cycle(&obs, &prices(&[("VCB", 96000.0)]), &state, AlertRule::Threshold);
    assert_eq!(plan.cleared, vec!["VCB".to_string()]);
    assert_eq!(plan.hits.len(), 1);
    assert_eq!(plan.hits[0].target, 97000.0);
}

#[tokio::test]
async fn alert_then_clear_cycle() {
    let (store, _dir) = file_store();
    let notifier = Recorder::new(true);
    let checker = AlertChecker::new(AlertRule::Threshold, SymbolPolicy::Observers, vec![], false);
    let obs = observers(&[("VCB", "95000")]);

    let report = checker.process(&store, &notifier, &obs, &prices(&[("VCB", 94000.0)])).await;
    assert_eq!(report.checked, 1);
    assert_eq!(report.alerts_sent, 1);
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(store.load_alert_state().await.get("VCB"), Some(&95000.0));

    let history = store.history(None).await;
    assert_eq!(history.len(), 1);
    assert_eq!((history[0].symbol.as_str(), history[0].target, history[0].price), ("VCB", 95000.0, 94000.0));

    // still below target: no second notification
    let report = checker.process(&store, &notifier, &obs, &prices(&[("VCB", 93000.0)])).await;
    assert_eq!(report.alerts_sent, 0);
    assert_eq!(notifier.sent().len(), 1);

    let report = checker.process(&store, &notifier, &obs, &prices(&[("VCB", 96000.0)])).await;
    assert_eq!(report.cleared, 1);
    assert_eq!(report.alerts_sent, 0);
    assert!(store.load_alert_state().await.is_empty());
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(store.history(None).await.len(), 1);
}

#[tokio::test]
async fn failed_send_keeps_symbol_armed() {
    let (store, _dir) = file_store();
    let notifier = Recorder::new(false);
    let checker = AlertChecker::new(AlertRule::Threshold, SymbolPolicy::Observers, vec![], false);
    let obs = observers(&[("VCB", "95000")]);

    let report = checker.process(&store, &notifier, &obs, &prices(&[("VCB", 94000.0)])).await;
    assert_eq!(report.alerts_sent, 0);
    assert!(store.load_alert_state().await.is_empty());
    assert!(store.history(None).await.is_empty());
    // the match itself is still logged
    assert_eq!(store.match_prices(Some("vcb")).await.len(), 1);

    checker.process(&store, &notifier, &obs, &prices(&[("VCB", 94000.0)])).await;
    assert_eq!(notifier.sent().len(), 2);
}

#[tokio::test]
async fn sampling_mode_rearms_when_price_moves() {
    let (store, _dir) = file_store();
    let notifier = Recorder::new(true);
    let checker = AlertChecker::new(AlertRule::Band(0.001), SymbolPolicy::Observers, vec![], true);
    let obs = observers(&[("HPG", "37000")]);

    checker.process(&store, &notifier, &obs, &prices(&[("HPG", 37000.0)])).await;
    checker.process(&store, &notifier, &obs, &prices(&[("HPG", 37000.0)])).await;
    assert_eq!(notifier.sent().len(), 1);

    checker.process(&store, &notifier, &obs, &prices(&[("HPG", 37010.0)])).await;
    assert_eq!(notifier.sent().len(), 2);
}

#[test]
fn symbols_to_fetch_follows_policy() {
    let obs = observers(&[("vcb", "1"), ("VNINDEX", "1200"), ("FPT", "")]);

    let checker = AlertChecker::new(AlertRule::Threshold, SymbolPolicy::Observers, vec!["CTG".into()], false);
    assert_eq!(checker.symbols_to_fetch(&obs), vec!["FPT".to_string(), "VCB".to_string()]);

    let checker = AlertChecker::new(AlertRule::Threshold, SymbolPolicy::Configured, vec!["CTG".into()], false);
    assert_eq!(checker.symbols_to_fetch(&obs), vec!["CTG".to_string()]);
}

#[tokio::test]
async fn moved_target_counts_as_alert_not_clear() {
    let (store, _dir) = file_store();
    let notifier = Recorder::new(true);
    let checker = AlertChecker::new(AlertRule::Threshold, SymbolPolicy::Observers, vec![], false);

    let px = prices(&[("VCB", 94000.0)]);
    checker.process(&store, &notifier, &observers(&[("VCB", "95000")]), &px).await;

    let report = checker.process(&store, &notifier, &observers(&[("VCB", "96000")]), &px).await;
    assert_eq!(report.alerts_sent, 1);
    assert_eq!(report.cleared, 0);
    assert_eq!(store.load_alert_state().await.get("VCB"), Some(&96000.0));
    assert_eq!(notifier.sent().len(), 2);
}
