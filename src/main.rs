use std::process::ExitCode;

use vnstockalert::{
    config, routes,
    services::{
        alert_monitor::spawn_alert_monitor,
        broadcast::{run_broadcast_once, spawn_broadcast_loop, symbols_summary},
        price_fetcher::PriceFetcher,
        telegram::TelegramClient,
    },
    AppState,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = config::load();

    let args: Vec<String> = std::env::args().skip(1).collect();

    // one-shot broadcast of the configured symbols, then exit
    if args.iter().any(|a| a == "--once") {
        tracing::info!("Symbols: {}", symbols_summary(&settings.symbols));
        let fetcher = PriceFetcher::new(&settings);
        let telegram = TelegramClient::new(&settings);
        return if run_broadcast_once(&settings, &fetcher, &telegram).await {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    // periodic broadcast only, no HTTP server
    if args.iter().any(|a| a == "--broadcast") {
        let fetcher = PriceFetcher::new(&settings);
        let telegram = TelegramClient::new(&settings);
        return match spawn_broadcast_loop(settings, fetcher, telegram).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("[broadcast] loop stopped: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let state = AppState::from_settings(settings.clone()).await;

    if settings.telegram_configured() {
        spawn_alert_monitor(state.clone());
    } else {
        tracing::warn!("TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set, background checker disabled");
    }

    let app = routes::app(state);

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("bind {} failed: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
