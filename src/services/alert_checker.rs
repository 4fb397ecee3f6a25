use std::{collections::HashMap, sync::Mutex};

use serde::Serialize;

use crate::{
    config::{RuleKind, Settings, SymbolPolicy, INDEX_CODES},
    models::{normalize_symbol, parse_target, AlertState, Observers, PriceMap},
    services::{price_lines::format_grouped, store::Store, telegram::Notify},
    AppState,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertRule {
    /// price <= target
    Threshold,
    /// target * (1 - band) < price < target * (1 + band)
    Band(f64),
}

impl AlertRule {
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.alert_rule {
            RuleKind::Threshold => AlertRule::Threshold,
            RuleKind::Band => AlertRule::Band(settings.price_band_pct),
        }
    }

    pub fn matches(&self, price: f64, target: f64) -> bool {
        match *self {
            AlertRule::Threshold => price <= target,
            AlertRule::Band(band) => {
                let low = target * (1.0 - band);
                let high = target * (1.0 + band);
                low < price && price < high
            }
        }
    }

    pub fn message(&self, hit: &Hit) -> String {
        let price = format_grouped(hit.price);
        let target = format_grouped(hit.target);
        match *self {
            AlertRule::Threshold => {
                format!("🔔 Price alert: {} = {} (target ≤ {})", hit.symbol, price, target)
            }
            AlertRule::Band(band) => format!(
                "🔔 Price alert: {} = {} (within {}% of target {})",
                hit.symbol,
                price,
                band * 100.0,
                target
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub symbol: String,
    pub target: f64,
    pub price: f64,
}

#[derive(Debug, Default, PartialEq)]
pub struct CyclePlan {
    pub hits: Vec<Hit>,
    // symbols whose alert state must be dropped
    pub cleared: Vec<String>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct CheckReport {
    pub checked: usize,
    pub alerts_sent: usize,
    pub cleared: usize,
}

/// Decides, without side effects, what one cycle should do.
///
/// A symbol alerts when its price satisfies `rule` for the parsed target and
/// it has not already alerted for that exact target. Alert state is cleared
/// when the price leaves the condition, when the target moved away from the
/// alerted one, or when the observer is gone. Symbols with no price this
/// cycle, or with an unparseable target, are left untouched.
pub fn plan_cycle(
    observers: &Observers,
    prices: &PriceMap,
    alert_state: &AlertState,
    rule: AlertRule,
) -> CyclePlan {
    let mut plan = CyclePlan::default();

    let observed: Vec<String> = observers.keys().map(|s| normalize_symbol(s)).collect();
    for symbol in alert_state.keys() {
        if !observed.contains(symbol) {
            plan.cleared.push(symbol.clone());
        }
    }

    for (raw_symbol, target_str) in observers {
        let symbol = normalize_symbol(raw_symbol);
        if target_str.trim().is_empty() {
            continue;
        }
        let Some(&price) = prices.get(&symbol) else {
            continue;
        };
        let Some(target) = parse_target(target_str) else {
            continue;
        };

        let alerted = alert_state.get(&symbol).copied();

        if !rule.matches(price, target) {
            if alerted.is_some() {
                plan.cleared.push(symbol);
            }
            continue;
        }

        match alerted {
            Some(t) if t == target => {}
            Some(_) => {
                plan.cleared.push(symbol.clone());
                plan.hits.push(Hit { symbol, target, price });
            }
            None => plan.hits.push(Hit { symbol, target, price }),
        }
    }

    plan
}

/// The evaluator: rule, symbol-selection policy and the sampling-mode memory.
pub struct AlertChecker {
    rule: AlertRule,
    policy: SymbolPolicy,
    configured_symbols: Vec<String>,
    sampling: bool,
    last_seen: Mutex<HashMap<String, f64>>,
}

impl AlertChecker {
    pub fn new(rule: AlertRule, policy: SymbolPolicy, configured_symbols: Vec<String>, sampling: bool) -> Self {
        Self {
            rule,
            policy,
            configured_symbols,
            sampling,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            AlertRule::from_settings(settings),
            settings.symbol_policy,
            settings.symbols.clone(),
            settings.sample_prices,
        )
    }

    /// Stock symbols to ask the providers for; index codes are added by the fetcher.
    pub fn symbols_to_fetch(&self, observers: &Observers) -> Vec<String> {
        match self.policy {
            SymbolPolicy::Configured => self.configured_symbols.clone(),
            SymbolPolicy::Observers => observers
                .keys()
                .map(|s| normalize_symbol(s))
                .filter(|s| !INDEX_CODES.iter().any(|c| c.eq_ignore_ascii_case(s)))
                .collect(),
        }
    }

    /// Sampling mode: a simulated price that moved re-arms the symbol.
    fn forget_moved_prices(&self, prices: &PriceMap, alert_state: &mut AlertState) -> bool {
        let mut seen = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        let mut changed = false;

        for (symbol, &price) in prices {
            if seen.get(symbol) != Some(&price) {
                changed |= alert_state.remove(symbol).is_some();
                seen.insert(symbol.clone(), price);
            }
        }
        changed
    }

    /// Applies one cycle against already-fetched prices.
    pub async fn process<N: Notify>(
        &self,
        store: &Store,
        notifier: &N,
        observers: &Observers,
        prices: &PriceMap,
    ) -> CheckReport {
        let mut alert_state = store.load_alert_state().await;
        let mut updated = false;

        if self.sampling {
            updated |= self.forget_moved_prices(prices, &mut alert_state);
        }

        let plan = plan_cycle(observers, prices, &alert_state, self.rule);
        let mut report = CheckReport {
            checked: observers
                .keys()
                .filter(|s| prices.contains_key(&normalize_symbol(s)))
                .count(),
            ..CheckReport::default()
        };

        for symbol in &plan.cleared {
            if alert_state.remove(symbol).is_some() {
                updated = true;
                // a moved target that alerts again this cycle is not a clear
                if !plan.hits.iter().any(|h| &h.symbol == symbol) {
                    report.cleared += 1;
                }
            }
        }

        for hit in &plan.hits {
            let msg = self.rule.message(hit);
            store.append_match_price(&hit.symbol, hit.target, hit.price).await;

            if notifier.send(&msg).await {
                alert_state.insert(hit.symbol.clone(), hit.target);
                store.append_history(&hit.symbol, hit.target, hit.price).await;
                updated = true;
                report.alerts_sent += 1;
                tracing::info!("Alert sent: {}", msg);
            }
        }

        if updated {
            store.save_alert_state(&alert_state).await;
        }

        report
    }
}

/// One full evaluation cycle: load observers, fetch prices, alert.
///
/// Skips quietly when Telegram isn't configured, when nobody is observing
/// anything, or when every provider failed.
pub async fn run_check(state: &AppState) -> CheckReport {
    if !state.settings.telegram_configured() {
        tracing::debug!("telegram not configured, skipping check");
        return CheckReport::default();
    }

    let observers = state.store.load_observers().await;
    if observers.is_empty() {
        return CheckReport::default();
    }

    let symbols = state.checker.symbols_to_fetch(&observers);
    let prices = state.fetcher.fetch_prices(&symbols, &INDEX_CODES).await;
    if prices.is_empty() {
        tracing::info!("no prices this cycle, skipping");
        return CheckReport::default();
    }

    state
        .checker
        .process(&state.store, &state.telegram, &observers, &prices)
        .await
}
