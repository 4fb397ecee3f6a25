//! Library entrypoint for the Vietnam stock alert service.
//!
//! The binary in `main.rs` is thin; integration tests under `tests/` import
//! the app state, routers, controllers and services from here.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub mod controllers;
pub mod routes;

use services::{
    alert_checker::AlertChecker, price_fetcher::PriceFetcher, store::Store, telegram::TelegramClient,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub store: Store,
    pub fetcher: PriceFetcher,
    pub telegram: TelegramClient,
    pub checker: Arc<AlertChecker>,
}

impl AppState {
    pub async fn from_settings(settings: config::Settings) -> Self {
        let store = Store::from_settings(&settings).await;
        let fetcher = PriceFetcher::new(&settings);
        let telegram = TelegramClient::new(&settings);
        let checker = Arc::new(AlertChecker::from_settings(&settings));

        Self {
            settings,
            store,
            fetcher,
            telegram,
            checker,
        }
    }
}
