//! Telegram notification sink
//!
//! Delivers notifications to a single chat via the Telegram Bot API:
//! `sendMessage` for text, `sendPhoto` with a caption when an image
//! attachment is flagged, and `deleteMessage` to clean up superseded
//! deliveries tracked in the sink's [`DedupTable`].
//!
//! Outbound calls go through a rate limiter (the Bot API allows roughly one
//! message per second per chat) and a client with an explicit timeout so a
//! hanging remote call can only delay a cycle, never stall the process.

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

use super::dedup::DedupTable;
use super::{DeliveryReceipt, Sink, SinkError, SinkResult};
use crate::events::NotificationFlags;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

fn default_timeout() -> u64 {
    10
}

fn default_requests_per_second() -> u32 {
    1
}

/// Telegram sink configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API token
    pub api_key: String,
    /// Target chat identifier
    pub chat_id: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Outbound request budget per second
    pub requests_per_second: u32,
}

impl TelegramConfig {
    /// Create a new configuration
    pub fn new(api_key: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            chat_id: chat_id.into(),
            timeout_secs: default_timeout(),
            requests_per_second: default_requests_per_second(),
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the outbound request budget
    pub fn with_requests_per_second(mut self, requests_per_second: u32) -> Self {
        self.requests_per_second = requests_per_second;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("Telegram API key cannot be empty".to_string());
        }
        if self.chat_id.is_empty() {
            return Err("Telegram chat ID cannot be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }
        if self.requests_per_second == 0 {
            return Err("Requests per second must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Bot API response envelope
///
/// `result` is method-dependent (a message object for sends, a bare boolean
/// for deletes), so it stays raw JSON until a caller asks for a field.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    description: Option<String>,
}

impl ApiResponse {
    fn message_id(&self) -> Option<i64> {
        self.result.as_ref()?.get("message_id")?.as_i64()
    }
}

/// Telegram Bot API sink with per-key message deduplication
pub struct TelegramSink {
    config: TelegramConfig,
    client: Client,
    base_url: String,
    dedup: Mutex<DedupTable>,
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl TelegramSink {
    /// Create a new Telegram sink
    ///
    /// # Errors
    ///
    /// Returns `SinkError::InvalidConfig` for bad configuration and
    /// `SinkError::Http` if the HTTP client cannot be created.
    pub fn new(config: TelegramConfig) -> SinkResult<Self> {
        config.validate().map_err(SinkError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let rate = NonZeroU32::new(config.requests_per_second)
            .unwrap_or_else(|| NonZeroU32::new(1).expect("1 is non-zero"));
        let limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            config,
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            dedup: Mutex::new(DedupTable::new()),
            limiter,
        })
    }

    /// Override the Bot API base URL, for testing with mock servers
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Identifiers currently tracked as outstanding for a key
    ///
    /// Introspection for diagnostics and tests; the dedup protocol itself is
    /// internal to [`deliver`](Sink::deliver).
    pub async fn outstanding_ids(&self, key: &str) -> Vec<i64> {
        self.dedup.lock().await.outstanding(key).to_vec()
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.config.api_key, method)
    }

    async fn parse_response(response: reqwest::Response) -> SinkResult<ApiResponse> {
        let status = response.status();
        let body: ApiResponse = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(SinkError::Api {
                    status: status.as_u16(),
                    description: "unreadable response body".to_string(),
                });
            }
            Err(e) => return Err(SinkError::Http(e)),
        };

        if !status.is_success() || !body.ok {
            return Err(SinkError::Api {
                status: status.as_u16(),
                description: body
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        Ok(body)
    }

    async fn send_text(&self, message: &str) -> SinkResult<i64> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&serde_json::json!({
                "chat_id": self.config.chat_id,
                "text": message,
            }))
            .send()
            .await?;

        let body = Self::parse_response(response).await?;
        body.message_id().ok_or_else(|| SinkError::Api {
            status: 200,
            description: "sendMessage response carried no message".to_string(),
        })
    }

    async fn send_photo(&self, caption: &str, filepath: &Path) -> SinkResult<i64> {
        let image_data = tokio::fs::read(filepath).await?;
        let filename = filepath
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.png".to_string());

        let form = reqwest::multipart::Form::new()
            .part(
                "photo",
                reqwest::multipart::Part::bytes(image_data).file_name(filename),
            )
            .text("chat_id", self.config.chat_id.clone())
            .text("caption", caption.to_string());

        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;

        let body = Self::parse_response(response).await?;
        body.message_id().ok_or_else(|| SinkError::Api {
            status: 200,
            description: "sendPhoto response carried no message".to_string(),
        })
    }

    async fn delete_message(&self, message_id: i64) -> SinkResult<()> {
        let response = self
            .client
            .post(self.method_url("deleteMessage"))
            .json(&serde_json::json!({
                "chat_id": self.config.chat_id,
                "message_id": message_id,
            }))
            .send()
            .await?;

        Self::parse_response(response).await.map(|_| ())
    }
}

#[async_trait]
impl Sink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    /// Deliver a message, superseding the previous delivery for the key
    ///
    /// Protocol: take the key's outstanding ids out of the table, delete
    /// each remotely (best-effort, failures logged), send the new message,
    /// record its id on confirmed success. A failed send therefore leaves
    /// the slot empty — the prior entry was already superseded, and only
    /// confirmed sends are tracked.
    async fn deliver(
        &self,
        message: &str,
        flags: &NotificationFlags,
        delete_previous_key: Option<&str>,
    ) -> SinkResult<DeliveryReceipt> {
        if let Some(key) = delete_previous_key {
            let previous = self.dedup.lock().await.take(key);
            for message_id in previous {
                self.limiter.until_ready().await;
                if let Err(e) = self.delete_message(message_id).await {
                    tracing::warn!(
                        key = %key,
                        message_id = %message_id,
                        error = %e,
                        "Failed to delete superseded telegram message"
                    );
                }
            }
        }

        self.limiter.until_ready().await;
        let message_id = match (flags.image, &flags.filepath) {
            (true, Some(path)) => self.send_photo(message, path).await?,
            _ => self.send_text(message).await?,
        };

        if let Some(key) = delete_previous_key {
            self.dedup.lock().await.record(key, vec![message_id]);
        }

        tracing::info!(message_id = %message_id, "Delivered telegram notification");
        Ok(DeliveryReceipt::new("telegram", vec![message_id]))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let valid = TelegramConfig::new("123:abc", "-100200");
        assert!(valid.validate().is_ok());

        let no_key = TelegramConfig::new("", "-100200");
        assert!(no_key.validate().is_err());

        let no_chat = TelegramConfig::new("123:abc", "");
        assert!(no_chat.validate().is_err());

        let zero_timeout = TelegramConfig::new("123:abc", "-100200").with_timeout(0);
        assert!(zero_timeout.validate().is_err());

        let zero_rate = TelegramConfig::new("123:abc", "-100200").with_requests_per_second(0);
        assert!(zero_rate.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = TelegramConfig::new("123:abc", "-100200")
            .with_timeout(30)
            .with_requests_per_second(5);

        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.requests_per_second, 5);
    }

    #[test]
    fn test_sink_rejects_invalid_config() {
        let sink = TelegramSink::new(TelegramConfig::new("", ""));
        assert!(matches!(sink, Err(SinkError::InvalidConfig(_))));
    }

    #[test]
    fn test_method_url_shape() {
        let sink = TelegramSink::new(TelegramConfig::new("123:abc", "-100200")).unwrap();
        assert_eq!(
            sink.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );

        let sink = sink.with_base_url("http://localhost:9999");
        assert_eq!(
            sink.method_url("deleteMessage"),
            "http://localhost:9999/bot123:abc/deleteMessage"
        );
    }

    #[test]
    fn test_api_response_parsing() {
        let ok: ApiResponse =
            serde_json::from_str(r#"{"ok":true,"result":{"message_id":42,"date":0}}"#).unwrap();
        assert!(ok.ok);
        assert_eq!(ok.message_id(), Some(42));

        // deleteMessage answers with a bare boolean result
        let deleted: ApiResponse = serde_json::from_str(r#"{"ok":true,"result":true}"#).unwrap();
        assert!(deleted.ok);
        assert_eq!(deleted.message_id(), None);

        let err: ApiResponse =
            serde_json::from_str(r#"{"ok":false,"description":"chat not found"}"#).unwrap();
        assert!(!err.ok);
        assert_eq!(err.description.as_deref(), Some("chat not found"));
    }
}
