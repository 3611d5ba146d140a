//! Telegram Bot API channel
//!
//! Text goes through `sendMessage` as JSON, images through `sendPhoto` as a
//! multipart upload. Both block the caller until the service answers.

use super::channel::NotificationChannel;
use crate::adapters::http_adapter::blocking_runtime;
use crate::config::NotifierConfig;
use crate::error::NotifyError;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use tokio::runtime::Runtime;

/// Channel delivering to one Telegram chat.
pub struct TelegramChannel {
    api_url: String,
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
    runtime: Runtime,
}

impl fmt::Debug for TelegramChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramChannel")
            .field("api_url", &self.api_url)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

fn delivery_error(e: reqwest::Error) -> NotifyError {
    // The request URL embeds the bot token
    NotifyError::Delivery(e.without_url().to_string())
}

async fn check_response(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(true);

    if status.is_success() && ok {
        Ok(())
    } else {
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            description: body
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        })
    }
}

impl TelegramChannel {
    /// Create a channel for `chat_id` using `bot_token` against `api_url`.
    pub fn new(
        api_url: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        Ok(Self {
            api_url: api_url.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            client: reqwest::Client::new(),
            runtime: blocking_runtime()?,
        })
    }

    /// Create a channel from the `[notifier]` configuration section.
    pub fn from_config(config: &NotifierConfig) -> Result<Self, NotifyError> {
        Self::new(&config.api_url, &config.bot_token, &config.chat_id)
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_url.trim_end_matches('/'),
            self.bot_token,
            method
        )
    }
}

impl NotificationChannel for TelegramChannel {
    fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        let payload = json!({ "chat_id": self.chat_id, "text": text });
        let request = self.client.post(self.method_url("sendMessage")).json(&payload);

        self.runtime.block_on(async {
            let response = request.send().await.map_err(delivery_error)?;
            check_response(response).await
        })
    }

    fn send_image(&self, path: &Path) -> Result<(), NotifyError> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .part("photo", Part::bytes(bytes).file_name(file_name));
        let request = self.client.post(self.method_url("sendPhoto")).multipart(form);

        self.runtime.block_on(async {
            let response = request.send().await.map_err(delivery_error)?;
            check_response(response).await
        })
    }
}
