//! Durable state: observers, alert state, alert history and the match-price log.
//!
//! `Store` picks the backend once at startup (`DATABASE_URL` set => Postgres,
//! otherwise JSON files) and never propagates failures: a read that fails is
//! logged and looks exactly like "nothing stored yet", a write that fails is
//! logged and dropped.

pub mod file_store;
pub mod pg_store;

pub use file_store::FileStore;
pub use pg_store::PgStore;

use crate::{
    config::Settings,
    error::StoreError,
    models::{AlertState, HistoryRecord, Observers},
};

#[derive(Debug, Clone)]
pub enum Store {
    File(FileStore),
    Postgres(PgStore),
}

fn logged<T: Default>(op: &str, res: Result<T, StoreError>) -> T {
    res.unwrap_or_else(|e| {
        tracing::warn!("{}: {}", op, e);
        T::default()
    })
}

impl Store {
    pub async fn from_settings(settings: &Settings) -> Self {
        let file = || Store::File(FileStore::new(settings.data_dir.clone(), settings.utc_offset_hours));

        if !settings.use_database() {
            tracing::info!("using file store at {}", settings.data_dir.display());
            return file();
        }

        match PgStore::connect_lazy(&settings.database_url, settings.utc_offset_hours) {
            Ok(pg) => {
                if let Err(e) = pg.init_schema().await {
                    tracing::warn!("db init_schema: {}", e);
                }
                tracing::info!("using database store");
                Store::Postgres(pg)
            }
            Err(e) => {
                tracing::warn!("invalid DATABASE_URL ({}), falling back to file store", e);
                file()
            }
        }
    }

    pub async fn load_observers(&self) -> Observers {
        let res = match self {
            Store::File(s) => s.load_observers().await,
            Store::Postgres(s) => s.load_observers().await,
        };
        logged("load_observers", res)
    }

    pub async fn save_observers(&self, observers: &Observers) {
        let res = match self {
            Store::File(s) => s.save_observers(observers).await,
            Store::Postgres(s) => s.save_observers(observers).await,
        };
        logged("save_observers", res)
    }

    pub async fn load_alert_state(&self) -> AlertState {
        let res = match self {
            Store::File(s) => s.load_alert_state().await,
            Store::Postgres(s) => s.load_alert_state().await,
        };
        logged("load_last_alerted", res)
    }

    pub async fn save_alert_state(&self, state: &AlertState) {
        let res = match self {
            Store::File(s) => s.save_alert_state(state).await,
            Store::Postgres(s) => s.save_alert_state(state).await,
        };
        logged("save_last_alerted", res)
    }

    pub async fn append_history(&self, symbol: &str, target: f64, price: f64) {
        let res = match self {
            Store::File(s) => s.append_history(symbol, target, price).await,
            Store::Postgres(s) => s.append_history(symbol, target, price).await,
        };
        logged("append_history", res)
    }

    pub async fn history(&self, symbol: Option<&str>) -> Vec<HistoryRecord> {
        let res = match self {
            Store::File(s) => s.history(symbol).await,
            Store::Postgres(s) => s.history(symbol).await,
        };
        logged("get_history_filtered", res)
    }

    pub async fn append_match_price(&self, symbol: &str, target: f64, price: f64) {
        let res = match self {
            Store::File(s) => s.append_match_price(symbol, target, price).await,
            Store::Postgres(s) => s.append_match_price(symbol, target, price).await,
        };
        logged("append_match_price", res)
    }

    pub async fn match_prices(&self, symbol: Option<&str>) -> Vec<HistoryRecord> {
        let res = match self {
            Store::File(s) => s.match_prices(symbol).await,
            Store::Postgres(s) => s.match_prices(symbol).await,
        };
        logged("get_match_price_filtered", res)
    }
}
