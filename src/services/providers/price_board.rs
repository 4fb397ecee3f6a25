use reqwest::Client;
use serde_json::{json, Value};

use crate::{
    error::FetchError,
    services::{price_lines::format_stock_line, symbols::stock_symbols},
};

const TICKER_KEYS: [&str; 3] = ["ticker", "organCode", "symbol"];
const PRICE_KEYS: [&str; 3] = ["price", "matchPrice", "p"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardSource {
    Kbs,
    Vci,
}

impl BoardSource {
    pub fn label(&self) -> &'static str {
        match self {
            BoardSource::Kbs => "KBS",
            BoardSource::Vci => "VCI",
        }
    }
}

/// Broker price boards (KBS first, then VCI).
#[derive(Clone)]
pub struct PriceBoardProvider {
    http: Client,
    kbs_url: String,
    vci_url: String,
}

impl PriceBoardProvider {
    pub fn new(http: Client, kbs_url: String, vci_url: String) -> Self {
        Self {
            http,
            kbs_url,
            vci_url,
        }
    }

    pub async fn fetch(&self, symbols: &[String]) -> Result<Option<String>, FetchError> {
        let stocks = stock_symbols(symbols, 20);
        if stocks.is_empty() {
            return Ok(None);
        }

        for source in [BoardSource::Kbs, BoardSource::Vci] {
            match self.board(source, &stocks).await {
                Ok(lines) if !lines.is_empty() => {
                    tracing::info!("price board {} OK", source.label());
                    return Ok(Some(lines.join("\n")));
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("price board {}: {}", source.label(), e),
            }
        }

        tracing::info!("price board returned no data (KBS and VCI)");
        Ok(None)
    }

    async fn board(&self, source: BoardSource, stocks: &[String]) -> Result<Vec<String>, FetchError> {
        let (url, payload) = match source {
            BoardSource::Kbs => (&self.kbs_url, json!({ "code": stocks.join(",") })),
            BoardSource::Vci => (&self.vci_url, json!({ "symbols": stocks })),
        };

        let res = self.http.post(url.as_str()).json(&payload).send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = res.json::<Value>().await?;
        Ok(board_lines(&body))
    }
}

/// Extracts `📈 SYM: price` lines from a price-board payload.
///
/// Boards disagree on shape: rows may be the top-level array or sit under
/// `data`, and the ticker/price may be nested one object deep
/// (`{"listingInfo": {"symbol": ..}, "matchPrice": {"matchPrice": ..}}`).
pub fn board_lines(body: &Value) -> Vec<String> {
    let rows = match body {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(rows)) => rows.as_slice(),
            _ => return vec![],
        },
        _ => return vec![],
    };

    rows.iter()
        .filter_map(|row| {
            let ticker = find_field(row, &TICKER_KEYS).and_then(as_text)?;
            let price = find_field(row, &PRICE_KEYS).and_then(as_number)?;
            let ticker = ticker.trim();
            if ticker.is_empty() {
                return None;
            }
            Some(format_stock_line(ticker, price, None))
        })
        .collect()
}

fn find_field<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let obj = row.as_object()?;

    for key in keys {
        match obj.get(*key) {
            Some(Value::Null) | None => {}
            Some(Value::Object(inner)) => {
                if let Some(v) = keys.iter().find_map(|k| inner.get(*k)).filter(|v| !v.is_null()) {
                    return Some(v);
                }
            }
            Some(v) => return Some(v),
        }
    }

    // one level down, e.g. listingInfo.symbol
    obj.values()
        .filter_map(Value::as_object)
        .find_map(|inner| keys.iter().find_map(|k| inner.get(*k)).filter(|v| !v.is_null() && !v.is_object()))
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|p| p.is_finite() && *p > 0.0)
}
