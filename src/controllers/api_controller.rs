use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    config::INDEX_CODES,
    models::normalize_symbol,
    services::{alert_checker, observers_service},
    AppState,
};

#[derive(Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

impl SymbolQuery {
    fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

fn error_json(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(json!({ "error": msg.into() }))).into_response()
}

// GET /api/symbols
pub async fn get_symbols(State(state): State<AppState>) -> Response {
    let observers = state.store.load_observers().await;
    let symbols: Vec<String> = observers.into_keys().collect();
    Json(json!({ "symbols": symbols })).into_response()
}

// GET /api/observers
pub async fn get_observers(State(state): State<AppState>) -> Response {
    Json(state.store.load_observers().await).into_response()
}

// POST /api/observers
pub async fn post_observers(State(state): State<AppState>, body: Bytes) -> Response {
    // malformed or non-object bodies count as "no observers"
    let value: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let incoming = observers_service::normalize_observers(&value);

    let saved = observers_service::replace_observers(&state, incoming).await;
    Json(json!({ "ok": true, "observers": saved })).into_response()
}

// GET /api/history?symbol=
pub async fn get_history(State(state): State<AppState>, Query(q): Query<SymbolQuery>) -> Response {
    let history = state.store.history(q.symbol()).await;
    Json(json!({ "history": history })).into_response()
}

// GET /api/match-price?symbol=
pub async fn get_match_price(State(state): State<AppState>, Query(q): Query<SymbolQuery>) -> Response {
    let rows = state.store.match_prices(q.symbol()).await;
    Json(json!({ "match_price": rows })).into_response()
}

// GET /api/price?symbol=
pub async fn get_price(State(state): State<AppState>, Query(q): Query<SymbolQuery>) -> Response {
    let Some(symbol) = q.symbol().map(normalize_symbol) else {
        return error_json(StatusCode::BAD_REQUEST, "Missing symbol");
    };

    let prices = state
        .fetcher
        .fetch_prices(std::slice::from_ref(&symbol), &INDEX_CODES)
        .await;

    match prices.get(&symbol) {
        Some(price) => Json(json!({ "symbol": symbol, "price": price })).into_response(),
        None => error_json(
            StatusCode::NOT_FOUND,
            format!(
                "Could not get price for {symbol}. All sources failed (price board, VNDirect, Yahoo). \
                 Try again later or check network/VPN."
            ),
        ),
    }
}

// GET|POST /api/check
pub async fn run_check(State(state): State<AppState>) -> Response {
    let task_state = state.clone();
    match tokio::spawn(async move { alert_checker::run_check(&task_state).await }).await {
        Ok(report) => Json(json!({
            "ok": true,
            "message": "Check completed",
            "checked": report.checked,
            "alerts_sent": report.alerts_sent,
            "cleared": report.cleared,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("api/check: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
