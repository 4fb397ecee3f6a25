use chrono::DateTime;
use reqwest::{header, Client};
use serde_json::Value;

use crate::{
    error::FetchError,
    services::{
        price_lines::{format_stock_line, line_symbol},
        symbols::stock_symbols,
    },
};

use super::vndirect_rest::BROWSER_UA;

/// Yahoo Finance chart API, `SYM.VN` tickers. Last resort.
#[derive(Clone)]
pub struct YahooProvider {
    http: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    async fn fetch_one(&self, symbol: &str) -> Result<Option<(f64, String)>, FetchError> {
        let url = format!("{}/{}.VN", self.base_url, symbol);
        let res = self
            .http
            .get(url)
            .query(&[("range", "5d"), ("interval", "1d")])
            .header(header::USER_AGENT, BROWSER_UA)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = res.json::<Value>().await?;
        Ok(last_close(&body))
    }

    pub async fn fetch(&self, symbols: &[String]) -> Result<Option<String>, FetchError> {
        let stocks = stock_symbols(symbols, 15);
        if stocks.is_empty() {
            return Ok(None);
        }

        let mut lines = Vec::new();
        for sym in &stocks {
            match self.fetch_one(sym).await {
                Ok(Some((close, date))) => lines.push(format_stock_line(sym, close, Some(&date))),
                Ok(None) => {}
                Err(e) => tracing::debug!("yahoo {}: {}", sym, e),
            }
        }

        if lines.is_empty() {
            tracing::info!("Yahoo Finance returned no data");
            return Ok(None);
        }

        lines.sort_by(|a, b| line_symbol(a).cmp(line_symbol(b)));
        Ok(Some(lines.join("\n")))
    }
}

/// Newest non-null close in a chart response, with its date.
pub fn last_close(body: &Value) -> Option<(f64, String)> {
    let result = body.pointer("/chart/result/0")?;
    let closes = result.pointer("/indicators/quote/0/close")?.as_array()?;
    let stamps = result.get("timestamp").and_then(|t| t.as_array());

    let (idx, close) = closes
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, c)| c.as_f64().map(|c| (i, c)))?;

    let date = stamps
        .and_then(|s| s.get(idx))
        .and_then(|t| t.as_i64())
        .and_then(|t| DateTime::from_timestamp(t, 0))
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    Some((close, date))
}
