//! SQLite-backed registry of monitored sites.
//!
//! - One `websites` table keyed by URL, created by versioned migrations
//! - Idempotent seeding of the initial site list
//! - Session-per-operation access through tokio-rusqlite

pub mod connection;
pub mod migrations;
pub mod sites;

pub use connection::SiteDb;
