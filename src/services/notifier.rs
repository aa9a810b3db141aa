// src/services/notifier.rs

//! Outbound chapter announcements.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Candidate, MessageConfig, TelegramConfig};
use crate::utils::text::truncate;

/// Delivers a formatted message to a single fixed destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
}

/// Format the announcement for one chapter.
///
/// Supported placeholders:
/// - `{title}`, `{number}`, `{heading}`, `{url}`
pub fn render_message(config: &MessageConfig, candidate: &Candidate) -> String {
    let title = truncate(&candidate.title, config.max_title_chars);
    let heading = match &candidate.number {
        Some(number) => format!("{number}: {title}"),
        None => title.clone(),
    };

    config
        .template
        .replace("{title}", &title)
        .replace("{number}", candidate.number.as_deref().unwrap_or_default())
        .replace("{heading}", &heading)
        .replace("{url}", &candidate.identifier)
}

/// Subset of the Bot API reply we care about.
#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages through the Telegram Bot API.
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, client: Client) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            chat_id: config.chat_id.clone(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("chat_id", self.chat_id.as_str()), ("text", message)])
            .send()
            .await
            // The endpoint embeds the bot token; keep it out of logs.
            .map_err(|e| AppError::Http(e.without_url()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AppError::Delivery {
            status: status.as_u16(),
            description: format!("reading reply failed: {}", e.without_url()),
        })?;
        let reply: Option<ApiReply> = serde_json::from_str(&body).ok();

        match reply {
            Some(ApiReply { ok: true, .. }) if status.is_success() => Ok(()),
            Some(ApiReply { description, .. }) => Err(AppError::Delivery {
                status: status.as_u16(),
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
            None if status.is_success() => Ok(()),
            None => Err(AppError::Delivery {
                status: status.as_u16(),
                description: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            }),
        }
    }
}
