//! Human-readable price lines shared by every provider.
//!
//! Providers emit lines such as `📈 VCB: 95,500 (2026-02-16)` for stocks and
//! `📊 VNINDEX: 1,250.52` for indices; the same text is what the `--once`
//! broadcast sends to Telegram, and `parse_price_lines` turns it back into a
//! `PriceMap` for the alert checker.

use num_format::{Locale, ToFormattedString};

use crate::models::PriceMap;

pub const STOCK_MARKER: &str = "📈";
pub const INDEX_MARKER: &str = "📊";

pub const FETCH_FAILED_TEXT: &str =
    "⚠️ Could not fetch prices. Check network and symbols (e.g. VCB, TCB, FPT).";

fn grouped(value: i64) -> String {
    value.to_formatted_string(&Locale::en)
}

/// `95500.4` -> `"95,500"`
pub fn format_grouped(value: f64) -> String {
    grouped(value.round() as i64)
}

pub fn format_stock_line(symbol: &str, price: f64, date: Option<&str>) -> String {
    let body = format!("{STOCK_MARKER} {symbol}: {}", format_grouped(price));
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => format!("{body} ({d})"),
        None => body,
    }
}

pub fn format_index_line(symbol: &str, value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!(
        "{INDEX_MARKER} {symbol}: {sign}{}.{:02}",
        grouped(cents / 100),
        cents % 100
    )
}

/// Symbol part of a line, used to sort provider output.
pub fn line_symbol(line: &str) -> &str {
    line.split(':').next().unwrap_or(line)
}

pub fn parse_price_lines(text: &str) -> PriceMap {
    let mut out = PriceMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || (!line.contains(STOCK_MARKER) && !line.contains(INDEX_MARKER)) {
            continue;
        }

        let rest = line.replace(STOCK_MARKER, "").replace(INDEX_MARKER, "");
        let Some((symbol, value)) = rest.trim().split_once(':') else {
            continue;
        };

        let symbol = symbol.trim();
        if symbol.is_empty() {
            continue;
        }

        // "95,500 (2026-02-16)" -> "95500"
        let value = value
            .trim()
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .replace(',', "");

        if let Ok(v) = value.parse::<f64>() {
            out.insert(symbol.to_string(), v);
        }
    }

    out
}
