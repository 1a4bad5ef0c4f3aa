//! Telegram notifier error types.

use std::sync::Arc;

/// Errors from the Telegram Bot API client.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// Bot token not configured.
    #[error("missing bot token: TELEGRAM_BOT_TOKEN not set")]
    MissingToken,

    /// Bot token rejected by the API.
    #[error("authentication failed: invalid bot token")]
    Unauthorized,

    /// The API answered with `ok: false`.
    #[error("telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    /// HTTP error response without an API error body.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Attachment could not be read.
    #[error("attachment error: {0}")]
    File(String),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest includes the request URL, which carries the bot token.
        let err = err.without_url();
        if err.is_timeout() { TelegramError::Timeout } else { TelegramError::Network(Arc::new(err)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelegramError::MissingToken;
        assert!(err.to_string().contains("bot token"));

        let err = TelegramError::Api { code: 400, description: "Bad Request: chat not found".into() };
        assert_eq!(err.to_string(), "telegram API error 400: Bad Request: chat not found");

        let err = TelegramError::HttpError { status: 502 };
        assert!(err.to_string().contains("502"));
    }
}
