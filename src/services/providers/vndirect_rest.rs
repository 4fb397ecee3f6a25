use chrono::{Duration as ChronoDuration, Local};
use futures_util::stream::{self, StreamExt};
use reqwest::{header, Client};
use serde_json::Value;
use tokio::time::{timeout_at, Duration, Instant};

use crate::{
    error::FetchError,
    services::{
        price_lines::{format_stock_line, line_symbol},
        symbols::stock_symbols,
    },
};

const MAX_WORKERS: usize = 10;
const LOOKBACK_DAYS: i64 = 10;

pub const BROWSER_UA: &str = "Mozilla/5.0 (compatible; StockBot/1.0)";

/// VNDirect daily bars, latest close per symbol.
#[derive(Clone)]
pub struct VndirectRestProvider {
    http: Client,
    url: String,
    request_timeout_sec: u64,
}

impl VndirectRestProvider {
    pub fn new(http: Client, url: String, request_timeout_sec: u64) -> Self {
        Self {
            http,
            url,
            request_timeout_sec,
        }
    }

    /// Returns `(close, bar date)` for the newest bar in the lookback window.
    pub async fn fetch_one(&self, symbol: &str) -> Result<Option<(f64, String)>, FetchError> {
        let today = Local::now().date_naive();
        let from = today - ChronoDuration::days(LOOKBACK_DAYS);
        let q = format!(
            "code:{}~date:gte:{}~date:lte:{}",
            symbol,
            from.format("%Y-%m-%d"),
            today.format("%Y-%m-%d")
        );

        let res = self
            .http
            .get(self.url.as_str())
            .query(&[("q", q.as_str()), ("size", "1"), ("sort", "date"), ("page", "1")])
            .header(header::USER_AGENT, BROWSER_UA)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = res.json::<Value>().await?;
        Ok(latest_close(&body))
    }

    pub async fn fetch(&self, symbols: &[String]) -> Result<Option<String>, FetchError> {
        let stocks = stock_symbols(symbols, 20);
        if stocks.is_empty() {
            return Ok(None);
        }

        let workers = MAX_WORKERS.min(stocks.len());
        let deadline = Instant::now() + Duration::from_secs(self.request_timeout_sec + 10);

        let mut results = stream::iter(stocks)
            .map(|sym| async move {
                let res = self.fetch_one(&sym).await;
                (sym, res)
            })
            .buffer_unordered(workers);

        let mut lines: Vec<String> = Vec::new();
        loop {
            match timeout_at(deadline, results.next()).await {
                Ok(Some((sym, Ok(Some((close, date)))))) => {
                    lines.push(format_stock_line(&sym, close, Some(&date)));
                }
                Ok(Some((_, Ok(None)))) => {}
                Ok(Some((sym, Err(e)))) => tracing::debug!("VNDirect {}: {}", sym, e),
                Ok(None) => break,
                Err(_) => {
                    tracing::info!("VNDirect fetch timed out, keeping {} result(s)", lines.len());
                    break;
                }
            }
        }

        if lines.is_empty() {
            tracing::info!("VNDirect returned no data (timeout or blocked)");
            return Ok(None);
        }

        lines.sort_by(|a, b| line_symbol(a).cmp(line_symbol(b)));
        Ok(Some(lines.join("\n")))
    }
}

/// `{"data": [{"close": 95.5, "date": "2026-02-16"}]}` -> `(95.5, "2026-02-16")`.
pub fn latest_close(body: &Value) -> Option<(f64, String)> {
    let bar = body.get("data")?.as_array()?.first()?;
    let close = bar.get("close")?.as_f64()?;
    let date: String = bar
        .get("date")
        .and_then(|d| d.as_str())
        .unwrap_or_default()
        .chars()
        .take(10)
        .collect();
    Some((close, date))
}
