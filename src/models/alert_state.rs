use std::collections::BTreeMap;

/// symbol -> target the last notification was sent for.
///
/// An entry lives only while the price keeps satisfying the alert rule for
/// that target; once it leaves, the entry is dropped so the symbol can alert
/// again.
pub type AlertState = BTreeMap<String, f64>;
