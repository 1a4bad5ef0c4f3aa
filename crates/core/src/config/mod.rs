//! Application configuration with layered loading.
//!
//! Configuration is loaded once at startup with figment and then passed to
//! every component that needs it:
//!
//! 1. Environment variables (JOBWATCH_*)
//! 2. Unprefixed TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID and DATABASE_URL
//! 3. TOML config file (explicit path or JOBWATCH_CONFIG_FILE)
//! 4. Built-in defaults

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::site::{SiteSeed, default_sites};

mod validation;

pub use validation::ConfigError;

/// Environment variables read without the `JOBWATCH_` prefix.
const LEGACY_ENV_KEYS: &[&str] = &["TELEGRAM_BOT_TOKEN", "TELEGRAM_CHAT_ID", "DATABASE_URL"];

/// Telegram chat identifier: a numeric id or a public `@channelname`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Name(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{id}"),
            ChatId::Name(name) => f.write_str(name),
        }
    }
}

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Telegram bot token. Required.
    #[serde(default)]
    pub telegram_bot_token: Option<String>,

    /// Destination chat for every notification. Required.
    #[serde(default)]
    pub telegram_chat_id: Option<ChatId>,

    /// Bot API base URL, overridable for a self-hosted Bot API server.
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    /// Mention prepended to alert messages.
    #[serde(default = "default_alert_mention")]
    pub alert_mention: String,

    /// Whether the delivered alert body carries the mention.
    #[serde(default = "default_true")]
    pub mention_on_alert: bool,

    /// Registry location: `sqlite:///<path>` or a bare file path.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Directory screenshots are written to.
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per page.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Upper bound for rendering one screenshot, in milliseconds.
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,

    /// Time given to the page to settle before capturing, in milliseconds.
    #[serde(default = "default_render_settle_ms")]
    pub render_settle_ms: u64,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Sites inserted into the registry on startup if missing.
    #[serde(default = "default_sites")]
    pub sites: Vec<SiteSeed>,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".into()
}

fn default_alert_mention() -> String {
    "@RachelKerry".into()
}

fn default_true() -> bool {
    true
}

fn default_database_url() -> String {
    "sqlite:///job_monitor.db".into()
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("screenshots")
}

fn default_user_agent() -> String {
    "jobwatch/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_render_timeout_ms() -> u64 {
    30_000
}

fn default_render_settle_ms() -> u64 {
    2_000
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_url: default_telegram_api_url(),
            alert_mention: default_alert_mention(),
            mention_on_alert: true,
            database_url: default_database_url(),
            screenshot_dir: default_screenshot_dir(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            render_timeout_ms: default_render_timeout_ms(),
            render_settle_ms: default_render_settle_ms(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            sites: default_sites(),
        }
    }
}

impl AppConfig {
    /// HTTP timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// `config_file` wins over `JOBWATCH_CONFIG_FILE` when both are given.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or parsed, or if
    /// validation fails after loading.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(config_file)
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The provider stack [`AppConfig::load`] extracts from.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let file = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("JOBWATCH_CONFIG_FILE").map(PathBuf::from));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(Env::raw().only(LEGACY_ENV_KEYS).map(|key| key.as_str().to_lowercase().into()))
            .merge(
                Env::prefixed("JOBWATCH_")
                    .ignore(&["CONFIG_FILE"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            )
    }

    /// The Telegram bot token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the token is not set.
    pub fn require_bot_token(&self) -> Result<&str, ConfigError> {
        self.telegram_bot_token.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "telegram_bot_token".into(),
            hint: "Set TELEGRAM_BOT_TOKEN or JOBWATCH_TELEGRAM_BOT_TOKEN".into(),
        })
    }

    /// The destination chat.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the chat id is not set.
    pub fn require_chat_id(&self) -> Result<&ChatId, ConfigError> {
        self.telegram_chat_id.as_ref().ok_or_else(|| ConfigError::Missing {
            field: "telegram_chat_id".into(),
            hint: "Set TELEGRAM_CHAT_ID or JOBWATCH_TELEGRAM_CHAT_ID".into(),
        })
    }

    /// Registry file path derived from `database_url`.
    ///
    /// `sqlite:///jobs.db` is relative to the working directory and
    /// `sqlite:////var/lib/jobs.db` is absolute. A value without a scheme is
    /// taken as a path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for any other scheme.
    pub fn db_path(&self) -> Result<PathBuf, ConfigError> {
        let url = self.database_url.trim();
        let invalid = |reason: &str| ConfigError::Invalid { field: "database_url".into(), reason: reason.into() };

        if let Some(path) = url.strip_prefix("sqlite:///") {
            if path.is_empty() {
                return Err(invalid("missing database file path"));
            }
            return Ok(PathBuf::from(path));
        }
        if url.starts_with("sqlite:") || url.contains("://") {
            return Err(invalid("only sqlite:///<path> URLs are supported"));
        }
        if url.is_empty() {
            return Err(invalid("must not be empty"));
        }
        Ok(PathBuf::from(url))
    }
}
