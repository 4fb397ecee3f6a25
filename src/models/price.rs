use std::collections::BTreeMap;

/// One evaluation cycle's prices, symbol -> last price.
pub type PriceMap = BTreeMap<String, f64>;
