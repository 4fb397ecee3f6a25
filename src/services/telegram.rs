use std::future::Future;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::time::Duration;

use crate::config::Settings;

const SEND_TIMEOUT_SECS: u64 = 15;

const CHAT_NOT_FOUND_HELP: &str = "Fix: 1) Open your bot in Telegram 2) Send /start or any message \
3) Get your Id from @userinfobot 4) Put that number in .env as TELEGRAM_CHAT_ID";

/// Anything that can deliver an alert message. Returns false on any failure.
pub trait Notify {
    fn send(&self, text: &str) -> impl Future<Output = bool> + Send;
}

/// Cuts `text` to at most `max` chars, the last three being `...` when
/// `max` leaves room for them.
pub fn truncate_message(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max < 3 {
        return text.chars().take(max).collect();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    max_len: usize,
}

impl TelegramClient {
    pub fn new(settings: &Settings) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            api_base: settings.telegram_api_base.clone(),
            bot_token: settings.telegram_bot_token.clone(),
            chat_id: settings.telegram_chat_id.trim().to_string(),
            max_len: settings.max_message_length,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    pub async fn send_message(&self, text: &str) -> bool {
        if !self.is_configured() {
            tracing::error!("TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID are required");
            return false;
        }

        let text = truncate_message(text, self.max_len);
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });

        let res = match self.http.post(url).json(&payload).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Telegram send failed: {}", e);
                return false;
            }
        };

        let status = res.status();
        if status.is_success() {
            return true;
        }

        let raw = res.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|v| v.get("description").and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or(raw);

        tracing::error!("Telegram error {}: {}", status.as_u16(), body);
        if status == StatusCode::BAD_REQUEST && body.to_lowercase().contains("chat not found") {
            tracing::info!("{}", CHAT_NOT_FOUND_HELP);
        }
        false
    }
}

impl Notify for TelegramClient {
    fn send(&self, text: &str) -> impl Future<Output = bool> + Send {
        self.send_message(text)
    }
}
