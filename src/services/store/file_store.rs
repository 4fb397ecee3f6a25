use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::StoreError,
    models::{
        history::{filter_by_symbol, push_capped},
        AlertState, HistoryRecord, Observers,
    },
};

const OBSERVERS_FILE: &str = "observers.json";
const HISTORY_FILE: &str = "history.json";
const LAST_ALERTED_FILE: &str = "last_alerted.json";
const MATCH_PRICE_FILE: &str = "match_price.json";

/// One pretty-printed JSON document per entity under `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    utc_offset_hours: i32,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>, utc_offset_hours: i32) -> Self {
        Self {
            dir: dir.into(),
            utc_offset_hours,
        }
    }

    async fn read<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(T::default());
        }
        let raw = tokio::fs::read(&path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec_pretty(value)?;

        // write-then-rename so readers never see a half-written file
        let tmp = self.dir.join(format!("{name}.tmp"));
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, self.dir.join(name)).await?;
        Ok(())
    }

    pub async fn load_observers(&self) -> Result<Observers, StoreError> {
        self.read(OBSERVERS_FILE).await
    }

    pub async fn save_observers(&self, observers: &Observers) -> Result<(), StoreError> {
        self.write(OBSERVERS_FILE, observers).await
    }

    pub async fn load_alert_state(&self) -> Result<AlertState, StoreError> {
        self.read(LAST_ALERTED_FILE).await
    }

    pub async fn save_alert_state(&self, state: &AlertState) -> Result<(), StoreError> {
        self.write(LAST_ALERTED_FILE, state).await
    }

    async fn append_record(&self, name: &str, symbol: &str, target: f64, price: f64) -> Result<(), StoreError> {
        let mut records: Vec<HistoryRecord> = self.read(name).await?;
        push_capped(
            &mut records,
            HistoryRecord::now(symbol, target, price, self.utc_offset_hours),
        );
        self.write(name, &records).await
    }

    pub async fn append_history(&self, symbol: &str, target: f64, price: f64) -> Result<(), StoreError> {
        self.append_record(HISTORY_FILE, symbol, target, price).await
    }

    pub async fn history(&self, symbol: Option<&str>) -> Result<Vec<HistoryRecord>, StoreError> {
        let records: Vec<HistoryRecord> = self.read(HISTORY_FILE).await?;
        Ok(filter_by_symbol(records, symbol))
    }

    pub async fn append_match_price(&self, symbol: &str, target: f64, price: f64) -> Result<(), StoreError> {
        self.append_record(MATCH_PRICE_FILE, symbol, target, price).await
    }

    pub async fn match_prices(&self, symbol: Option<&str>) -> Result<Vec<HistoryRecord>, StoreError> {
        let records: Vec<HistoryRecord> = self.read(MATCH_PRICE_FILE).await?;
        Ok(filter_by_symbol(records, symbol))
    }
}
