use serde_json::Value;

use crate::{
    config::INDEX_CODES,
    models::{normalize_symbol, parse_target, Observers},
    AppState,
};

/// Turns a posted JSON body into an observer mapping.
///
/// Anything that isn't an object becomes an empty mapping. Keys are trimmed
/// and uppercased (empty keys dropped); `null` values are dropped; strings are
/// trimmed and other scalars stringified.
pub fn normalize_observers(body: &Value) -> Observers {
    let mut out = Observers::new();
    let Some(map) = body.as_object() else {
        return out;
    };

    for (key, value) in map {
        let symbol = normalize_symbol(key);
        if symbol.is_empty() {
            continue;
        }
        let target = match value {
            Value::Null => continue,
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        out.insert(symbol, target);
    }
    out
}

/// Replaces the whole observer mapping.
///
/// Every symbol whose target string changed (and parses) gets a history row
/// right away, priced with a fresh quote or, failing that, the target itself.
pub async fn replace_observers(state: &AppState, incoming: Observers) -> Observers {
    let old = state.store.load_observers().await;
    state.store.save_observers(&incoming).await;

    for (symbol, target_str) in &incoming {
        if target_str.is_empty() || old.get(symbol) == Some(target_str) {
            continue;
        }
        let Some(target) = parse_target(target_str) else {
            continue;
        };

        let prices = state
            .fetcher
            .fetch_prices(std::slice::from_ref(symbol), &INDEX_CODES)
            .await;
        let price = prices.get(symbol).copied().unwrap_or(target);

        state.store.append_history(symbol, target, price).await;
        tracing::info!(
            "History row added for {} (target changed to {}, price {})",
            symbol,
            target,
            price
        );
    }

    incoming
}
