use std::collections::BTreeMap;

/// symbol -> target price exactly as the user typed it (e.g. "95,000").
pub type Observers = BTreeMap<String, String>;

pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Parses a user-entered target, tolerating thousands separators.
pub fn parse_target(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
