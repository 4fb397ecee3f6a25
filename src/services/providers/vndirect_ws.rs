use std::collections::{BTreeMap, HashSet};

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::time::{timeout, Duration, Instant};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as TMessage};

use crate::{
    error::FetchError,
    models::normalize_symbol,
    services::{
        price_lines::{format_index_line, format_stock_line},
        symbols::stock_symbols,
    },
};

// BA = bid/ask (carries match price), MI = market information (index value)
const BA: &str = "BA";
const MI: &str = "MI";

const MI_IDS: [(&str, &str); 6] = [
    ("10", "VNINDEX"),
    ("11", "VN30"),
    ("12", "HNX30"),
    ("13", "VNXALL"),
    ("02", "HNX"),
    ("03", "UPCOM"),
];

fn market_name(id: &str) -> Option<&'static str> {
    MI_IDS.iter().find(|(k, _)| *k == id).map(|(_, v)| *v)
}

/// Realtime VNDirect feed: register interest, then drain frames for a fixed window.
#[derive(Clone)]
pub struct VndirectSocketProvider {
    url: String,
    wait: Duration,
    connect_timeout: Duration,
}

#[derive(Debug, Default)]
pub struct SocketSnapshot {
    pub stocks: BTreeMap<String, f64>,
    pub indices: BTreeMap<String, f64>,
}

impl SocketSnapshot {
    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty() && self.indices.is_empty()
    }

    /// Applies one text frame. Frames that aren't BA/MI, or are too short, are ignored.
    pub fn ingest(&mut self, frame: &str) {
        let Ok(obj) = serde_json::from_str::<serde_json::Value>(frame) else {
            return;
        };
        let typ = obj.get("type").and_then(|v| v.as_str()).unwrap_or_default();
        let Some(data) = obj.get("data").and_then(|v| v.as_str()) else {
            return;
        };
        let fields: Vec<&str> = data.split('|').collect();

        if typ == BA && fields.len() >= 16 {
            if let Ok(price) = fields[15].trim().parse::<f64>() {
                self.stocks.insert(fields[1].trim().to_string(), price);
            }
        } else if typ == MI && fields.len() >= 8 {
            if let Some(name) = market_name(fields[0].trim()) {
                if let Ok(value) = fields[7].trim().parse::<f64>() {
                    self.indices.insert(name.to_string(), value);
                }
            }
        }
    }

    /// Index lines first, then stocks, each sorted by symbol.
    pub fn to_lines(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .indices
            .iter()
            .map(|(k, v)| format_index_line(k, *v))
            .chain(self.stocks.iter().map(|(k, v)| format_stock_line(k, *v, None)))
            .collect();
        Some(lines.join("\n"))
    }
}

fn regist_consumer(name: &str, codes: &[String]) -> String {
    json!({
        "type": "registConsumer",
        "data": { "sequence": 0, "params": { "name": name, "codes": codes } },
    })
    .to_string()
}

impl VndirectSocketProvider {
    pub fn new(url: String, wait: Duration, connect_timeout: Duration) -> Self {
        Self {
            url,
            wait,
            connect_timeout,
        }
    }

    pub async fn fetch(&self, symbols: &[String]) -> Result<Option<String>, FetchError> {
        let wanted: HashSet<String> = symbols.iter().map(|s| normalize_symbol(s)).collect();
        let stocks = stock_symbols(symbols, 20);
        let index_ids: Vec<String> = MI_IDS
            .iter()
            .filter(|(_, name)| wanted.contains(*name))
            .map(|(id, _)| id.to_string())
            .collect();

        if stocks.is_empty() && index_ids.is_empty() {
            return Ok(None);
        }

        let (ws, _) = timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| FetchError::Timeout(self.connect_timeout.as_secs()))??;

        let (mut write, mut read) = ws.split();

        if !stocks.is_empty() {
            write.send(TMessage::Text(regist_consumer(BA, &stocks))).await?;
        }
        if !index_ids.is_empty() {
            write.send(TMessage::Text(regist_consumer(MI, &index_ids))).await?;
        }

        let mut snapshot = SocketSnapshot::default();
        let deadline = Instant::now() + self.wait;

        while Instant::now() < deadline {
            let left = deadline
                .saturating_duration_since(Instant::now())
                .max(Duration::from_millis(500));
            let step = left.min(Duration::from_secs(2));

            match timeout(step, read.next()).await {
                Err(_) => break,
                Ok(None) => break,
                Ok(Some(Ok(TMessage::Text(txt)))) => snapshot.ingest(&txt),
                Ok(Some(Ok(TMessage::Ping(payload)))) => {
                    let _ = write.send(TMessage::Pong(payload)).await;
                }
                Ok(Some(Ok(TMessage::Close(_)))) => break,
                Ok(Some(Ok(_))) => {}
                Ok(Some(Err(e))) => {
                    tracing::debug!("VNDirect WS read: {}", e);
                    break;
                }
            }
        }

        let _ = write.close().await;
        Ok(snapshot.to_lines())
    }
}
