//! Telegram sink — sends briefing text to one chat via the Bot API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::deliver::{Formatting, MessageSink};
use crate::error::DeliveryError;

/// Hard maximum accepted by Telegram's `sendMessage`.
pub const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Default chunk limit: strictly below the hard maximum to leave headroom
/// for transport-added metadata.
pub const DEFAULT_CHUNK_LIMIT: usize = 3900;

const API_BASE: &str = "https://api.telegram.org";

pub struct TelegramSink {
    api_base: String,
    bot_token: SecretString,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramSink {
    pub fn new(bot_token: SecretString, chat_id: impl Into<String>) -> Self {
        Self::with_api_base(API_BASE, bot_token, chat_id)
    }

    pub fn with_api_base(
        api_base: impl Into<String>,
        bot_token: SecretString,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            bot_token,
            chat_id: chat_id.into(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base,
            self.bot_token.expose_secret()
        )
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, text: &str, formatting: Formatting) -> Result<(), DeliveryError> {
        let mut body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });
        if formatting == Formatting::Rich {
            body["parse_mode"] = serde_json::Value::String("Markdown".to_string());
        }

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::SendFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        // A 400 on a Markdown send is almost always malformed markup from the
        // generated text; surface it as a rejection so the caller can retry
        // plain.
        if formatting == Formatting::Rich && status == reqwest::StatusCode::BAD_REQUEST {
            Err(DeliveryError::Rejected {
                formatting: "rich".to_string(),
                reason: format!("{status}: {detail}"),
            })
        } else {
            Err(DeliveryError::SendFailed {
                reason: format!("{status}: {detail}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_embeds_token_and_method() {
        let sink = TelegramSink::new(SecretString::from("123:ABC"), "42");
        assert_eq!(
            sink.api_url("sendMessage"),
            "https://api.telegram.org/bot123:ABC/sendMessage"
        );
    }

    #[test]
    fn default_limit_leaves_headroom() {
        assert!(DEFAULT_CHUNK_LIMIT < TELEGRAM_MAX_MESSAGE_LENGTH);
    }

    #[tokio::test]
    async fn unreachable_api_is_send_failed() {
        let sink =
            TelegramSink::with_api_base("http://127.0.0.1:1", SecretString::from("t"), "42");
        let err = sink.send("hello", Formatting::Plain).await.unwrap_err();
        assert!(matches!(err, DeliveryError::SendFailed { .. }));
    }
}
