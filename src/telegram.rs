//! Telegram Bot API adapter
//!
//! Thin HTTPS wrapper over the Bot API: sending and editing messages with
//! inline keyboards, answering callback queries, and long-polling
//! `getUpdates`. Handlers never use this type directly; they go through
//! the [`ChatTransport`] trait so tests can substitute an in-memory
//! transport.
//!
//! # Setup
//!
//! 1. Create a bot via @BotFather on Telegram
//! 2. Put the token in the config file or `MENTOR_BOT_TOKEN`

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::menu::InlineKeyboard;

/// Telegram API base URL
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather (format: 123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11)
    #[serde(default)]
    pub bot_token: String,
    /// Bot username, used to build referral links (t.me/<username>?start=...)
    #[serde(default)]
    pub bot_username: String,
    /// Optional photo sent with the welcome message on /start
    #[serde(default)]
    pub welcome_photo: Option<std::path::PathBuf>,
    /// API base URL (for self-hosted bot API servers)
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    TELEGRAM_API_BASE.to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            bot_username: String::new(),
            welcome_photo: None,
            api_base: default_api_base(),
        }
    }
}

impl TelegramConfig {
    /// Create a new config with bot token
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            ..Self::default()
        }
    }

    /// Check if Telegram is properly configured
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && self.bot_token.contains(':')
    }

    /// Get API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }
}

/// Telegram client for sending and receiving messages
#[derive(Debug, Clone)]
pub struct TelegramClient {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

/// Telegram API response envelope
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i32>,
}

impl<T> TelegramResponse<T> {
    fn into_result(self) -> Result<T> {
        if self.ok {
            self.result.context("No result in Telegram response")
        } else {
            let error_msg = self
                .description
                .unwrap_or_else(|| "Unknown error".to_string());
            error!("Telegram API error: {} (code: {:?})", error_msg, self.error_code);
            bail!("Telegram API error: {}", error_msg)
        }
    }
}

/// Telegram message info
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub date: i64,
    pub text: Option<String>,
    pub chat: TelegramChat,
    pub from: Option<TelegramUser>,
}

/// Telegram chat info
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// Telegram user info
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

/// Inline keyboard selection event
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramCallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    pub message: Option<TelegramMessage>,
    pub data: Option<String>,
}

/// Telegram update (incoming message or callback)
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
    pub callback_query: Option<TelegramCallbackQuery>,
}

/// Send message request
#[derive(Debug, Serialize)]
struct SendMessageRequest {
    chat_id: String,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<serde_json::Value>,
}

impl TelegramClient {
    /// Create a new Telegram client
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, http_client })
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// Test the bot token and get bot info
    pub async fn get_me(&self) -> Result<TelegramUser> {
        let url = self.config.api_url("getMe");

        let response: TelegramResponse<TelegramUser> = self
            .http_client
            .get(&url)
            .send()
            .await
            .context("Failed to connect to Telegram API")?
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        response.into_result()
    }

    /// Get updates (incoming messages and callback queries)
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u32,
        limit: u32,
    ) -> Result<Vec<TelegramUpdate>> {
        let url = self.config.api_url("getUpdates");

        #[derive(Serialize)]
        struct GetUpdatesRequest {
            #[serde(skip_serializing_if = "Option::is_none")]
            offset: Option<i64>,
            limit: u32,
            timeout: u32,
            allowed_updates: &'static [&'static str],
        }

        let request = GetUpdatesRequest {
            offset,
            limit,
            timeout: timeout_secs,
            allowed_updates: &["message", "callback_query"],
        };

        let response: TelegramResponse<Vec<TelegramUpdate>> = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to get Telegram updates")?
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        response.into_result()
    }
}

/// Outbound side of the chat transport. The router talks only to this
/// trait; `TelegramClient` is the production implementation.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a text message, optionally with an inline keyboard.
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()>;

    /// Edit a previously sent message in place.
    async fn edit_message(
        &self,
        chat_id: &str,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()>;

    /// Send a photo with a caption.
    async fn send_photo(&self, chat_id: &str, photo: Vec<u8>, caption: &str) -> Result<()>;

    /// Acknowledge an inline-keyboard selection, optionally with a toast.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}

#[async_trait::async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        let url = self.config.api_url("sendMessage");

        let request = SendMessageRequest {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            reply_markup: keyboard.map(InlineKeyboard::to_value),
        };

        debug!("Sending Telegram message to {}", chat_id);

        let response: TelegramResponse<TelegramMessage> = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send Telegram message")?
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        response.into_result()?;
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: &str,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        let url = self.config.api_url("editMessageText");

        #[derive(Serialize)]
        struct EditRequest {
            chat_id: String,
            message_id: i64,
            text: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            reply_markup: Option<serde_json::Value>,
        }

        let request = EditRequest {
            chat_id: chat_id.to_string(),
            message_id,
            text: text.to_string(),
            reply_markup: keyboard.map(InlineKeyboard::to_value),
        };

        let response: TelegramResponse<TelegramMessage> = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to edit Telegram message")?
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        response.into_result()?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: &str, photo: Vec<u8>, caption: &str) -> Result<()> {
        let url = self.config.api_url("sendPhoto");

        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part(
                "photo",
                reqwest::multipart::Part::bytes(photo)
                    .file_name("welcome.jpg")
                    .mime_str("image/jpeg")?,
            );

        let response: TelegramResponse<TelegramMessage> = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send Telegram photo")?
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        response.into_result()?;
        info!("Telegram photo sent to {}", chat_id);
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let url = self.config.api_url("answerCallbackQuery");

        #[derive(Serialize)]
        struct AnswerRequest {
            callback_query_id: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            text: Option<String>,
        }

        let request = AnswerRequest {
            callback_query_id: callback_id.to_string(),
            text: text.map(String::from),
        };

        let response: TelegramResponse<bool> = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to answer callback query")?
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        if !response.ok {
            bail!(
                "Telegram API error: {}",
                response
                    .description
                    .unwrap_or_else(|| "Unknown error".to_string())
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let config = TelegramConfig::new("123456:valid_token_format");
        assert!(config.is_configured());

        let config = TelegramConfig::new("invalid_token");
        assert!(!config.is_configured());

        let config = TelegramConfig::new("");
        assert!(!config.is_configured());
    }

    #[test]
    fn test_api_url_generation() {
        let config = TelegramConfig::new("123456:token");
        assert_eq!(
            config.api_url("sendMessage"),
            "https://api.telegram.org/bot123456:token/sendMessage"
        );
        assert_eq!(
            config.api_url("getMe"),
            "https://api.telegram.org/bot123456:token/getMe"
        );
    }

    #[test]
    fn test_update_envelope_parses_callback_queries() {
        let raw = r#"{
            "update_id": 7,
            "callback_query": {
                "id": "cb1",
                "from": { "id": 42, "is_bot": false, "first_name": "Alice", "username": "alice" },
                "message": {
                    "message_id": 5,
                    "date": 0,
                    "text": "Choose an action:",
                    "chat": { "id": 42, "type": "private", "username": "alice", "first_name": "Alice" },
                    "from": null
                },
                "data": "materials"
            }
        }"#;
        let update: TelegramUpdate = serde_json::from_str(raw).unwrap();
        let callback = update.callback_query.unwrap();
        assert_eq!(callback.data.as_deref(), Some("materials"));
        assert_eq!(callback.message.unwrap().message_id, 5);
    }
}
