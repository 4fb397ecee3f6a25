use std::sync::Arc;

use reqwest::Client;
use tokio::time::Duration;

use crate::{
    config::{ProviderToggles, Settings},
    error::FetchError,
    models::{normalize_symbol, PriceMap},
    services::{
        price_lines::{parse_price_lines, FETCH_FAILED_TEXT},
        providers::{PriceBoardProvider, VndirectRestProvider, VndirectSocketProvider, YahooProvider},
        sample_feed::{SampleFeed, SAMPLE_SYMBOL},
    },
};

/// Fallback chain over the price providers.
///
/// Order is fixed: price board -> VNDirect socket -> VNDirect REST -> Yahoo.
/// The first enabled provider that produces at least one line wins; every
/// provider error is logged and treated as "no data".
#[derive(Clone)]
pub struct PriceFetcher {
    toggles: ProviderToggles,
    board: PriceBoardProvider,
    socket: VndirectSocketProvider,
    rest: VndirectRestProvider,
    yahoo: YahooProvider,
    sample: Option<Arc<SampleFeed>>,
}

fn outcome(provider: &str, res: Result<Option<String>, FetchError>) -> Option<String> {
    match res {
        Ok(Some(text)) if !text.trim().is_empty() => {
            tracing::info!("{} OK", provider);
            Some(text)
        }
        Ok(_) => None,
        Err(e) => {
            tracing::info!("{} failed: {}", provider, e);
            None
        }
    }
}

impl PriceFetcher {
    pub fn new(settings: &Settings) -> Self {
        let timeout = Duration::from_secs(settings.request_timeout_sec);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("http client build failed ({}), using defaults", e);
                Client::new()
            });

        let sample = settings.sample_prices.then(|| {
            tracing::info!(
                "Sample price mode: {} only, random {}-{} every {} min",
                SAMPLE_SYMBOL,
                settings.sample_hpg_min,
                settings.sample_hpg_max,
                settings.sample_rotate_minutes
            );
            Arc::new(SampleFeed::new(
                settings.sample_hpg_min,
                settings.sample_hpg_max,
                Duration::from_secs(settings.sample_rotate_minutes * 60),
            ))
        });

        Self {
            toggles: settings.providers,
            board: PriceBoardProvider::new(
                http.clone(),
                settings.price_board_kbs_url.clone(),
                settings.price_board_vci_url.clone(),
            ),
            socket: VndirectSocketProvider::new(
                settings.vndirect_ws_url.clone(),
                Duration::from_secs(settings.ws_wait_sec),
                timeout,
            ),
            rest: VndirectRestProvider::new(
                http.clone(),
                settings.vndirect_rest_url.clone(),
                settings.request_timeout_sec,
            ),
            yahoo: YahooProvider::new(http, settings.yahoo_chart_url.clone()),
            sample,
        }
    }

    /// Price lines for `symbols` (plus `index_codes` on the realtime feed),
    /// or the warning text when every provider came back empty.
    pub async fn fetch_text(&self, symbols: &[String], index_codes: &[&str]) -> String {
        if self.toggles.price_board {
            tracing::info!("Trying price board...");
            if let Some(text) = outcome("price board", self.board.fetch(symbols).await) {
                return text;
            }
        }

        if self.toggles.vndirect_ws {
            tracing::info!("Trying VNDirect WebSocket (realtime)...");
            let mut wanted = symbols.to_vec();
            wanted.extend(index_codes.iter().map(|c| c.to_string()));
            if let Some(text) = outcome("VNDirect WebSocket", self.socket.fetch(&wanted).await) {
                return text;
            }
        }

        if self.toggles.vndirect_rest {
            tracing::info!("Trying VNDirect REST...");
            if let Some(text) = outcome("VNDirect REST", self.rest.fetch(symbols).await) {
                return text;
            }
        }

        if self.toggles.yahoo {
            tracing::info!("Trying Yahoo Finance (.VN)...");
            if let Some(text) = outcome("Yahoo Finance", self.yahoo.fetch(symbols).await) {
                return text;
            }
        }

        FETCH_FAILED_TEXT.to_string()
    }

    /// Current prices keyed by symbol. Empty means "no data this cycle", never zero prices.
    pub async fn fetch_prices(&self, symbols: &[String], index_codes: &[&str]) -> PriceMap {
        if let Some(feed) = &self.sample {
            let mut out = PriceMap::new();
            if symbols.iter().any(|s| normalize_symbol(s) == SAMPLE_SYMBOL) {
                out.insert(SAMPLE_SYMBOL.to_string(), feed.price());
            }
            return out;
        }

        let text = self.fetch_text(symbols, index_codes).await;
        if text.starts_with("⚠️") {
            return PriceMap::new();
        }
        parse_price_lines(&text)
    }
}
