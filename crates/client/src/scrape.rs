//! Fetch-and-extract for monitored sites.
//!
//! [`Scraper::scrape`] never fails: network, HTTP and parse errors are logged
//! and reported as an empty [`Extraction`], which the monitor treats as
//! "extraction failed" for this run.

use jobwatch_core::{Error, SiteKind};

use crate::extract::{Extraction, extractor_for};
use crate::fetch::FetchClient;

/// Produces the listing text of a site.
#[async_trait::async_trait]
pub trait Scraper: Send + Sync {
    /// Fetch `url` and extract it with the extractor for `kind`.
    async fn scrape(&self, url: &str, kind: SiteKind) -> Extraction;
}

/// [`Scraper`] backed by an HTTP fetch and the per-kind extractors.
#[derive(Debug, Clone)]
pub struct PageScraper {
    fetch: FetchClient,
}

impl PageScraper {
    pub fn new(fetch: FetchClient) -> Self {
        Self { fetch }
    }

    /// Fetch and extract, surfacing the failure instead of swallowing it.
    pub async fn try_scrape(&self, url: &str, kind: SiteKind) -> Result<Extraction, Error> {
        let response = self.fetch.fetch(url).await?;
        let extraction = extractor_for(kind).extract(&response.text())?;

        tracing::debug!(
            %url,
            %kind,
            chars = extraction.text.len(),
            selector = extraction.screenshot_selector.as_deref().unwrap_or("<full page>"),
            "extracted listing"
        );
        Ok(extraction)
    }
}

#[async_trait::async_trait]
impl Scraper for PageScraper {
    async fn scrape(&self, url: &str, kind: SiteKind) -> Extraction {
        match self.try_scrape(url, kind).await {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!(%url, %kind, error = %e, "scrape failed");
                Extraction::empty()
            }
        }
    }
}
