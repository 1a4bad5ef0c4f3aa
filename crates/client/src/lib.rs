//! Client code for jobwatch.
//!
//! This crate provides the HTTP fetch of monitored pages, per-site listing
//! extraction, headless screenshots and Telegram delivery used by the
//! monitor binary.

pub mod extract;
pub mod fetch;
pub mod notify;
pub mod render;
pub mod scrape;

pub use extract::{Extraction, Extractor, OccupopExtractor, RezoomoExtractor, extractor_for};
pub use fetch::{FetchClient, FetchConfig, FetchResponse};
pub use notify::{NotificationEvent, Notifier, Severity, TelegramConfig, TelegramError, TelegramNotifier};
#[cfg(feature = "render")]
pub use render::HeadlessCapturer;
pub use render::{CaptureOptions, Capturer, RenderError, screenshot_file_name, screenshot_path};
pub use scrape::{PageScraper, Scraper};
