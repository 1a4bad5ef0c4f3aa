//! Monitored-site model types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::fingerprint::Fingerprint;

/// Page layout family of a monitored site; selects the content extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
    /// Rezoomo company job boards.
    Rezoomo,
    /// Occupop hosted careers pages.
    Occupop,
}

impl SiteKind {
    pub const ALL: [SiteKind; 2] = [SiteKind::Rezoomo, SiteKind::Occupop];

    /// Tag stored in the `scraper_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteKind::Rezoomo => "rezoomo",
            SiteKind::Occupop => "occupop",
        }
    }
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a site-type tag that matches no [`SiteKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown site kind: {0:?}")]
pub struct UnknownKind(pub String);

impl FromStr for SiteKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SiteKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A row of the site registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredSite {
    pub id: i64,
    pub url: String,
    pub kind: SiteKind,
    pub last_content_hash: Option<Fingerprint>,
    pub hash_updated_at: Option<String>,
}

/// A site to insert into the registry if it is not there yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSeed {
    pub url: String,
    pub kind: SiteKind,
}

impl SiteSeed {
    pub fn new(url: impl Into<String>, kind: SiteKind) -> Self {
        Self { url: url.into(), kind }
    }
}

/// Sites registered on first run.
pub fn default_sites() -> Vec<SiteSeed> {
    vec![
        SiteSeed::new(
            "https://www.rezoomo.com/company/the-national-maternity-hospital/jobs/?source=iframe",
            SiteKind::Rezoomo,
        ),
        SiteSeed::new("https://www.rezoomo.com/company/coombe-hospital/jobs/?source=iframe", SiteKind::Rezoomo),
        SiteSeed::new("https://therotundahospital.occupop-careers.com/", SiteKind::Occupop),
    ]
}
