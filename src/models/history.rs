use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

pub const HISTORY_LIMIT: usize = 500;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub symbol: String,
    pub target: f64,
    pub price: f64,
    // local wall-clock time, TIMESTAMP_FORMAT
    pub at: String,
}

impl HistoryRecord {
    pub fn now(symbol: &str, target: f64, price: f64, utc_offset_hours: i32) -> Self {
        Self {
            symbol: symbol.to_string(),
            target,
            price,
            at: local_timestamp(utc_offset_hours),
        }
    }
}

pub fn local_timestamp(utc_offset_hours: i32) -> String {
    let local = Utc::now().naive_utc() + Duration::hours(i64::from(utc_offset_hours));
    local.format(TIMESTAMP_FORMAT).to_string()
}

/// Newest-first insert, evicting whatever falls past `HISTORY_LIMIT`.
pub fn push_capped(records: &mut Vec<HistoryRecord>, record: HistoryRecord) {
    records.insert(0, record);
    records.truncate(HISTORY_LIMIT);
}

pub fn filter_by_symbol(records: Vec<HistoryRecord>, symbol: Option<&str>) -> Vec<HistoryRecord> {
    match symbol.map(str::trim).filter(|s| !s.is_empty()) {
        Some(sym) => records
            .into_iter()
            .filter(|r| r.symbol.eq_ignore_ascii_case(sym))
            .collect(),
        None => records,
    }
}
