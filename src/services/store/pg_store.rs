use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tokio::time::Duration;

use crate::{
    error::StoreError,
    models::{history::local_timestamp, AlertState, HistoryRecord, Observers, HISTORY_LIMIT},
};

const SCHEMA: [&str; 8] = [
    r#"
    CREATE TABLE IF NOT EXISTS observers (
        symbol VARCHAR(20) PRIMARY KEY,
        target_price TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS history (
        id SERIAL PRIMARY KEY,
        symbol VARCHAR(20) NOT NULL,
        target NUMERIC NOT NULL,
        price NUMERIC NOT NULL,
        at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS last_alerted (
        symbol VARCHAR(20) PRIMARY KEY,
        target NUMERIC NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_history_symbol ON history(symbol)",
    "CREATE INDEX IF NOT EXISTS idx_history_at ON history(at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS observer_price_change (
        id SERIAL PRIMARY KEY,
        symbol VARCHAR(20) NOT NULL,
        target NUMERIC NOT NULL,
        price NUMERIC NOT NULL,
        at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_observer_price_change_symbol ON observer_price_change(symbol)",
    "CREATE INDEX IF NOT EXISTS idx_observer_price_change_at ON observer_price_change(at DESC)",
];

#[derive(Clone, Copy)]
enum Log {
    History,
    MatchPrice,
}

impl Log {
    fn table(self) -> &'static str {
        match self {
            Log::History => "history",
            Log::MatchPrice => "observer_price_change",
        }
    }
}

/// Hosted Postgres URLs often come as `postgres://` without TLS settings.
pub fn normalize_database_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    if let Some(rest) = url.strip_prefix("postgres://") {
        url = format!("postgresql://{rest}");
    }
    if url.starts_with("postgresql") && !url.contains("sslmode") {
        let sep = if url.contains('?') { '&' } else { '?' };
        url = format!("{url}{sep}sslmode=require");
    }
    url
}

/// Newest-first listing; `id` breaks ties between rows stamped in the same second.
pub fn list_sql(table: &str, by_symbol: bool) -> String {
    let filter = if by_symbol { " WHERE UPPER(symbol) = UPPER($1)" } else { "" };
    format!(
        "SELECT symbol, target::float8 AS target, price::float8 AS price, \
         to_char(at, 'YYYY-MM-DD HH24:MI:SS') AS at \
         FROM {table}{filter} ORDER BY at DESC, id DESC LIMIT {HISTORY_LIMIT}"
    )
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    utc_offset_hours: i32,
}

impl PgStore {
    /// Builds the pool without touching the network; connections open on first use.
    pub fn connect_lazy(url: &str, utc_offset_hours: i32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(&normalize_database_url(url))?;

        Ok(Self {
            pool,
            utc_offset_hours,
        })
    }

    pub async fn init_schema(&self) -> Result<(), StoreError> {
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn load_observers(&self) -> Result<Observers, StoreError> {
        let rows = sqlx::query("SELECT symbol, target_price FROM observers")
            .fetch_all(&self.pool)
            .await?;

        let mut out = Observers::new();
        for row in rows {
            let symbol: String = row.try_get("symbol")?;
            let target: Option<String> = row.try_get("target_price")?;
            out.insert(symbol, target.unwrap_or_default());
        }
        Ok(out)
    }

    pub async fn save_observers(&self, observers: &Observers) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM observers").execute(&mut *tx).await?;
        for (symbol, target) in observers {
            let symbol = symbol.trim().to_uppercase();
            if symbol.is_empty() {
                continue;
            }
            sqlx::query(
                "INSERT INTO observers (symbol, target_price) VALUES ($1, $2) \
                 ON CONFLICT (symbol) DO UPDATE SET target_price = EXCLUDED.target_price",
            )
            .bind(symbol)
            .bind(target.trim())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn load_alert_state(&self) -> Result<AlertState, StoreError> {
        let rows = sqlx::query("SELECT symbol, target::float8 AS target FROM last_alerted")
            .fetch_all(&self.pool)
            .await?;

        let mut out = AlertState::new();
        for row in rows {
            out.insert(row.try_get("symbol")?, row.try_get("target")?);
        }
        Ok(out)
    }

    pub async fn save_alert_state(&self, state: &AlertState) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM last_alerted").execute(&mut *tx).await?;
        for (symbol, target) in state {
            sqlx::query(
                "INSERT INTO last_alerted (symbol, target) VALUES ($1, $2::float8) \
                 ON CONFLICT (symbol) DO UPDATE SET target = EXCLUDED.target",
            )
            .bind(symbol)
            .bind(*target)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn append(&self, log: Log, symbol: &str, target: f64, price: f64) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} (symbol, target, price, at) VALUES ($1, $2::float8, $3::float8, $4::timestamp)",
            log.table()
        );
        sqlx::query(&sql)
            .bind(symbol)
            .bind(target)
            .bind(price)
            .bind(local_timestamp(self.utc_offset_hours))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, log: Log, symbol: Option<&str>) -> Result<Vec<HistoryRecord>, StoreError> {
        let symbol = symbol.map(str::trim).filter(|s| !s.is_empty());
        let sql = list_sql(log.table(), symbol.is_some());

        let rows = match symbol {
            Some(sym) => sqlx::query(&sql).bind(sym).fetch_all(&self.pool).await?,
            None => sqlx::query(&sql).fetch_all(&self.pool).await?,
        };

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(HistoryRecord {
                symbol: row.try_get("symbol")?,
                target: row.try_get::<Option<f64>, _>("target")?.unwrap_or(0.0),
                price: row.try_get::<Option<f64>, _>("price")?.unwrap_or(0.0),
                at: row.try_get::<Option<String>, _>("at")?.unwrap_or_default(),
            });
        }
        Ok(out)
    }

    pub async fn append_history(&self, symbol: &str, target: f64, price: f64) -> Result<(), StoreError> {
        self.append(Log::History, symbol, target, price).await
    }

    pub async fn history(&self, symbol: Option<&str>) -> Result<Vec<HistoryRecord>, StoreError> {
        self.list(Log::History, symbol).await
    }

    pub async fn append_match_price(&self, symbol: &str, target: f64, price: f64) -> Result<(), StoreError> {
        self.append(Log::MatchPrice, symbol, target, price).await
    }

    pub async fn match_prices(&self, symbol: Option<&str>) -> Result<Vec<HistoryRecord>, StoreError> {
        self.list(Log::MatchPrice, symbol).await
    }
}
