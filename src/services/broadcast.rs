use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::{
    config::{Settings, INDEX_CODES},
    models::history::local_timestamp,
    services::{price_fetcher::PriceFetcher, telegram::TelegramClient},
};

const SHOWN_SYMBOLS: usize = 15;

pub fn broadcast_message(timestamp: &str, body: &str) -> String {
    format!("🇻🇳 Vietnam stock @ {timestamp}\n\n{body}")
}

/// `VCB, TCB, ...` with at most 15 names.
pub fn symbols_summary(symbols: &[String]) -> String {
    let shown: Vec<&str> = symbols.iter().take(SHOWN_SYMBOLS).map(String::as_str).collect();
    let more = if symbols.len() > SHOWN_SYMBOLS { "..." } else { "" };
    format!("{}{}", shown.join(", "), more)
}

/// Push a snapshot of the configured symbols to Telegram.
pub async fn run_broadcast_once(settings: &Settings, fetcher: &PriceFetcher, telegram: &TelegramClient) -> bool {
    if !settings.telegram_configured() {
        tracing::error!("Set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID in .env");
        return false;
    }
    if settings.symbols.is_empty() {
        tracing::error!("Set STOCK_SYMBOLS in .env (e.g. VCB,TCB,FPT,VNINDEX,VN30)");
        return false;
    }

    tracing::info!("Fetching prices...");
    let body = fetcher.fetch_text(&settings.symbols, &INDEX_CODES).await;
    let msg = broadcast_message(&local_timestamp(settings.utc_offset_hours), &body);

    let ok = telegram.send_message(&msg).await;
    if ok {
        tracing::info!("Sent to Telegram ({} chars)", msg.chars().count());
    }
    ok
}

/// `--broadcast`: a snapshot every `BROADCAST_INTERVAL_SEC`, first one right away.
pub fn spawn_broadcast_loop(settings: Settings, fetcher: PriceFetcher, telegram: TelegramClient) -> JoinHandle<()> {
    let secs = settings.broadcast_interval_sec.max(1);
    tracing::info!("Starting Vietnam stock -> Telegram (every {} s)", secs);
    tracing::info!("Symbols: {}", symbols_summary(&settings.symbols));

    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if !run_broadcast_once(&settings, &fetcher, &telegram).await {
                tracing::warn!("[broadcast] snapshot not sent");
            }
        }
    })
}
