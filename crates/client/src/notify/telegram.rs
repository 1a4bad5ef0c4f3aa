//! Telegram Bot API notifier.
//!
//! ### Transport
//!
//! - **Text**: `POST {api_url}/bot{token}/sendMessage` with a JSON body
//!   `{chat_id, text, disable_notification}`.
//! - **Attachments**: `POST {api_url}/bot{token}/sendDocument` as a multipart
//!   form, one request per file, after the text and with the same silent flag.
//! - **Result**: a response counts as delivered only if its body has
//!   `"ok": true`.
//!
//! The token is part of every request URL and is never logged.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use jobwatch_core::{AppConfig, ChatId, ConfigError};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{NotificationEvent, Notifier, Severity, TelegramError};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Telegram notifier configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: ChatId,
    /// Base URL (default: https://api.telegram.org).
    pub api_url: String,
    /// Prefix for alert messages; `None` sends alerts unprefixed.
    pub mention: Option<String>,
    /// Request timeout (default: 30s).
    pub timeout: Duration,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url)
            .field("mention", &self.mention)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TryFrom<&AppConfig> for TelegramConfig {
    type Error = ConfigError;

    fn try_from(config: &AppConfig) -> Result<Self, Self::Error> {
        let mention = Some(config.alert_mention.trim())
            .filter(|m| config.mention_on_alert && !m.is_empty())
            .map(str::to_string);

        Ok(Self {
            bot_token: config.require_bot_token()?.to_string(),
            chat_id: config.require_chat_id()?.clone(),
            api_url: config.telegram_api_url.clone(),
            mention,
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API client bound to one chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    /// Create a new notifier with the given configuration.
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramError> {
        if config.bot_token.trim().is_empty() {
            return Err(TelegramError::MissingToken);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| TelegramError::Network(Arc::new(e)))?;

        Ok(Self { http, config })
    }

    /// Send a silent message, followed by `files` as documents.
    pub async fn send_message(&self, text: &str, files: &[impl AsRef<Path> + Sync]) -> Result<(), TelegramError> {
        self.deliver(text, files, true).await
    }

    /// Send an audible message prefixed with the configured mention,
    /// followed by `files` as documents.
    pub async fn send_alert(&self, text: &str, files: &[impl AsRef<Path> + Sync]) -> Result<(), TelegramError> {
        self.deliver(&self.alert_text(text), files, false).await
    }

    /// Body delivered for an alert.
    pub fn alert_text(&self, text: &str) -> String {
        match &self.config.mention {
            Some(mention) => format!("{mention} {text}"),
            None => text.to_string(),
        }
    }

    async fn deliver(&self, text: &str, files: &[impl AsRef<Path> + Sync], silent: bool) -> Result<(), TelegramError> {
        self.post_message(text, silent).await?;
        for file in files {
            self.post_document(file.as_ref(), silent).await?;
        }

        tracing::debug!(chat = %self.config.chat_id, silent, files = files.len(), "telegram message delivered");
        Ok(())
    }

    async fn post_message(&self, text: &str, silent: bool) -> Result<(), TelegramError> {
        let body = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "disable_notification": silent,
        });

        let response = self.http.post(self.endpoint("sendMessage")).json(&body).send().await?;
        check(response).await
    }

    async fn post_document(&self, path: &Path, silent: bool) -> Result<(), TelegramError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| TelegramError::File(format!("{}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());

        let form = Form::new()
            .text("chat_id", self.config.chat_id.to_string())
            .text("disable_notification", silent.to_string())
            .part("document", Part::bytes(bytes).file_name(file_name));

        let response = self.http.post(self.endpoint("sendDocument")).multipart(form).send().await?;
        check(response).await
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.config.api_url.trim_end_matches('/'), self.config.bot_token, method)
    }
}

/// Map a Bot API response to success or a [`TelegramError`].
async fn check(response: reqwest::Response) -> Result<(), TelegramError> {
    let status = response.status();
    if status == 401 {
        return Err(TelegramError::Unauthorized);
    }

    let bytes = response.bytes().await?;
    match serde_json::from_slice::<ApiResponse>(&bytes) {
        Ok(api) if api.ok => Ok(()),
        Ok(api) => Err(TelegramError::Api {
            code: api.error_code.unwrap_or(i64::from(status.as_u16())),
            description: api.description.unwrap_or_default(),
        }),
        Err(_) if !status.is_success() => Err(TelegramError::HttpError { status: status.as_u16() }),
        Err(e) => Err(TelegramError::Parse(e.to_string())),
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, event: &NotificationEvent) -> Result<(), TelegramError> {
        match event.severity {
            Severity::Alert => self.send_alert(&event.text, event.files.as_slice()).await,
            Severity::Inform => self.send_message(&event.text, event.files.as_slice()).await,
        }
    }
}
