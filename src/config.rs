use std::{env, path::PathBuf};

pub const INDEX_CODES: [&str; 4] = ["VNINDEX", "VN30", "HNXIndex", "HNX30"];

const DEFAULT_SYMBOLS: &str = "CTG, VIB";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleKind {
    // price <= target
    Threshold,
    // target * (1 - band) < price < target * (1 + band)
    Band,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolPolicy {
    // fetch only what observers reference
    Observers,
    // fetch STOCK_SYMBOLS regardless of observers
    Configured,
}

#[derive(Debug, Clone, Copy)]
pub struct ProviderToggles {
    pub price_board: bool,
    pub vndirect_ws: bool,
    pub vndirect_rest: bool,
    pub yahoo: bool,
}

impl ProviderToggles {
    pub fn none() -> Self {
        Self {
            price_board: false,
            vndirect_ws: false,
            vndirect_rest: false,
            yahoo: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub telegram_api_base: String,
    pub max_message_length: usize,

    pub symbols: Vec<String>,
    pub database_url: String,
    pub data_dir: PathBuf,
    pub utc_offset_hours: i32,

    pub check_interval_sec: u64,
    pub broadcast_interval_sec: u64,
    pub alert_rule: RuleKind,
    pub price_band_pct: f64,
    pub symbol_policy: SymbolPolicy,

    pub request_timeout_sec: u64,
    pub ws_wait_sec: u64,
    pub vndirect_ws_url: String,
    pub vndirect_rest_url: String,
    pub price_board_kbs_url: String,
    pub price_board_vci_url: String,
    pub yahoo_chart_url: String,
    pub providers: ProviderToggles,

    pub sample_prices: bool,
    pub sample_hpg_min: u32,
    pub sample_hpg_max: u32,
    pub sample_rotate_minutes: u64,
}

impl Settings {
    pub fn telegram_configured(&self) -> bool {
        !self.telegram_bot_token.is_empty() && !self.telegram_chat_id.is_empty()
    }

    pub fn use_database(&self) -> bool {
        !self.database_url.is_empty()
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| default.to_string())
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    var(key).and_then(|s| s.parse::<T>().ok()).unwrap_or(default)
}

fn flag(key: &str, default: bool) -> bool {
    match var(key) {
        Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"),
        None => default,
    }
}

pub fn split_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let alert_rule = match var_or("ALERT_RULE", "band").to_lowercase().as_str() {
        "threshold" | "below" => RuleKind::Threshold,
        _ => RuleKind::Band,
    };

    let symbol_policy = match var_or("SYMBOL_POLICY", "observers").to_lowercase().as_str() {
        "configured" | "symbols" => SymbolPolicy::Configured,
        _ => SymbolPolicy::Observers,
    };

    let telegram_api_base = var_or("TELEGRAM_API_BASE", "https://api.telegram.org")
        .trim_end_matches('/')
        .to_string();

    Settings {
        host: var_or("HOST", "0.0.0.0"),
        port: parsed("PORT", 5003),

        telegram_bot_token: var_or("TELEGRAM_BOT_TOKEN", ""),
        telegram_chat_id: var_or("TELEGRAM_CHAT_ID", ""),
        telegram_api_base,
        max_message_length: parsed("MAX_MESSAGE_LENGTH", 4096),

        symbols: split_symbols(&var_or("STOCK_SYMBOLS", DEFAULT_SYMBOLS)),
        database_url: var_or("DATABASE_URL", ""),
        data_dir: PathBuf::from(var_or("LOCAL_DATA_DIR", "local-data")),
        utc_offset_hours: parsed("UTC_OFFSET_HOURS", 7),

        check_interval_sec: parsed("CHECK_INTERVAL_SEC", 30),
        broadcast_interval_sec: parsed("BROADCAST_INTERVAL_SEC", 60),
        alert_rule,
        price_band_pct: parsed("PRICE_BAND_PCT", 0.001),
        symbol_policy,

        request_timeout_sec: parsed("REQUEST_TIMEOUT", 8),
        ws_wait_sec: parsed("WS_WAIT_SEC", 5),
        vndirect_ws_url: var_or(
            "VNDIRECT_WS_URL",
            "wss://price-cmc-04.vndirect.com.vn/realtime/websocket",
        ),
        vndirect_rest_url: var_or(
            "VNDIRECT_REST_URL",
            "https://finfo-api.vndirect.com.vn/v4/stock_prices",
        ),
        price_board_kbs_url: var_or(
            "PRICE_BOARD_KBS_URL",
            "https://kbbuddywts.kbsec.com.vn/iis-server/investment/stock/priceboard",
        ),
        price_board_vci_url: var_or(
            "PRICE_BOARD_VCI_URL",
            "https://trading.vietcap.com.vn/api/price/symbols/getList",
        ),
        yahoo_chart_url: var_or(
            "YAHOO_CHART_URL",
            "https://query1.finance.yahoo.com/v8/finance/chart",
        )
        .trim_end_matches('/')
        .to_string(),
        providers: ProviderToggles {
            price_board: flag("PROVIDER_PRICE_BOARD", true),
            vndirect_ws: flag("PROVIDER_VNDIRECT_WS", true),
            vndirect_rest: flag("PROVIDER_VNDIRECT_REST", true),
            yahoo: flag("PROVIDER_YAHOO", true),
        },

        sample_prices: flag("SAMPLE_PRICES", false),
        sample_hpg_min: parsed("SAMPLE_HPG_MIN", 35_000),
        sample_hpg_max: parsed("SAMPLE_HPG_MAX", 40_000),
        sample_rotate_minutes: parsed("SAMPLE_PRICES_ROTATE_MINUTES", 1),
    }
}
