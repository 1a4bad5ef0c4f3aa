//! Core types and shared functionality for jobwatch.
//!
//! This crate provides:
//! - Site registry with SQLite backend
//! - Content fingerprints
//! - Unified error types
//! - Configuration loading and validation

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod registry;
pub mod site;

pub use config::{AppConfig, ChatId, ConfigError};
pub use error::Error;
pub use fingerprint::{Fingerprint, fingerprint};
pub use registry::SiteDb;
pub use site::{MonitoredSite, SiteKind, SiteSeed, default_sites};
