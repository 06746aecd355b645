//! Telegram notification sink.
//!
//! Delivery is best-effort: failures are reported to the operator but never
//! change the run's outcome or exit code.

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

const TELEGRAM_API: &str = "https://api.telegram.org";
/// Telegram caps messages at 4096 characters; clamp below that so the
/// truncation marker always fits.
const MAX_MESSAGE_CHARS: usize = 4000;
const SEND_ATTEMPTS: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(5);
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) struct Notifier {
    http: reqwest::Client,
    token: String,
    chat_id: i64,
}

impl Notifier {
    pub(crate) fn new(token: &str, chat_id: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(anyhow!("bot token is empty"));
        }
        let chat_id: i64 = chat_id
            .trim()
            .parse()
            .context("chat id must be numeric")?;
        let http = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            token: token.to_string(),
            chat_id,
        })
    }

    pub(crate) async fn send(&self, text: &str) -> Result<()> {
        let url = format!("{TELEGRAM_API}/bot{}/sendMessage", self.token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": clamp_message(text),
            "disable_web_page_preview": true,
        });

        let mut last_error = None;
        for attempt in 1..=SEND_ATTEMPTS {
            match self.http.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => {
                    last_error = Some(anyhow!("sendMessage returned {}", resp.status()));
                }
                Err(err) => {
                    last_error = Some(anyhow!("sendMessage request failed: {err}"));
                }
            }
            if attempt < SEND_ATTEMPTS {
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("sendMessage failed")))
    }
}

fn clamp_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let clipped: String = text.chars().take(MAX_MESSAGE_CHARS).collect();
    format!("{clipped}\n\n(message truncated)")
}
