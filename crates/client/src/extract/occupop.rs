//! Occupop careers pages.
//!
//! The listing lives in the `div` enclosing a styled-components `h2`
//! (class `css-…`) titled "Job listing". The whole page is screenshotted.

use jobwatch_core::{Error, SiteKind};
use scraper::Html;

use super::{Extraction, Extractor, JOB_LISTING_LABEL, find_heading, joined_text, nearest_div};

/// Extractor for Occupop hosted careers pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct OccupopExtractor;

impl Extractor for OccupopExtractor {
    fn kind(&self) -> SiteKind {
        SiteKind::Occupop
    }

    fn extract(&self, html: &str) -> Result<Extraction, Error> {
        let document = Html::parse_document(html);

        let heading = find_heading(&document, JOB_LISTING_LABEL, Some("css"))
            .ok_or_else(|| Error::ExtractFailed(format!("no {JOB_LISTING_LABEL:?} heading")))?;
        let section = nearest_div(heading)
            .ok_or_else(|| Error::ExtractFailed(format!("{JOB_LISTING_LABEL:?} heading has no enclosing div")))?;

        Ok(Extraction::new(joined_text(section), None))
    }
}
