use crate::models::normalize_symbol;

/// Codes the feeds treat as market indices rather than tickers.
pub const INDEX_SET: [&str; 7] = ["VNINDEX", "VN30", "HNXINDEX", "HNX30", "HNX", "UPCOM", "VNXALL"];

pub fn is_index(symbol: &str) -> bool {
    let sym = normalize_symbol(symbol);
    INDEX_SET.contains(&sym.as_str())
}

/// Uppercased, de-duplicated stock symbols (indices removed), at most `cap`.
pub fn stock_symbols(symbols: &[String], cap: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for s in symbols {
        let sym = normalize_symbol(s);
        if sym.is_empty() || is_index(&sym) || out.contains(&sym) {
            continue;
        }
        out.push(sym);
        if out.len() == cap {
            break;
        }
    }
    out
}
