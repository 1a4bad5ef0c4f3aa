//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the Telegram token or chat id is
    /// absent, and `ConfigError::Invalid` if:
    /// - the token is blank or the database URL is unsupported
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - the settle delay does not fit inside the render timeout
    /// - the viewport has a zero dimension
    /// - `user_agent` is empty
    /// - a seed site is not an http(s) URL or appears twice
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.require_bot_token()?.trim().is_empty() {
            return Err(invalid("telegram_bot_token", "must not be empty"));
        }
        self.require_chat_id()?;

        url::Url::parse(&self.telegram_api_url).map_err(|e| invalid("telegram_api_url", e.to_string()))?;

        self.db_path()?;

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.render_settle_ms >= self.render_timeout_ms {
            return Err(invalid("render_settle_ms", "must be shorter than render_timeout_ms"));
        }

        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(invalid("viewport", "width and height must be greater than 0"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        let mut seen = HashSet::new();
        for site in &self.sites {
            let parsed = url::Url::parse(&site.url).map_err(|e| invalid("sites", format!("{}: {e}", site.url)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(invalid("sites", format!("{}: only http(s) URLs can be monitored", site.url)));
            }
            if !seen.insert(site.url.as_str()) {
                return Err(invalid("sites", format!("{} is listed more than once", site.url)));
            }
        }

        if self.sites.is_empty() {
            tracing::warn!("no seed sites configured; only sites already in the registry will be checked");
        }

        Ok(())
    }
}
