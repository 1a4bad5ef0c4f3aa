//! Job-listing extraction from fetched HTML.
//!
//! Each [`SiteKind`] maps to one [`Extractor`]. An extractor turns a page
//! into a stable text fragment (the input of the fingerprint) and, when the
//! layout allows it, the CSS selector of the element worth screenshotting.
//!
//! ### Text flattening
//! - [`joined_text`]: every text node trimmed, empty nodes dropped, joined
//!   with single spaces
//! - [`stripped_text`]: every text node trimmed and concatenated

pub mod occupop;
pub mod rezoomo;

pub use occupop::OccupopExtractor;
pub use rezoomo::RezoomoExtractor;

use std::sync::LazyLock;

use jobwatch_core::{Error, SiteKind};
use scraper::{ElementRef, Html, Selector};

/// Heading text that marks the job-listing section on both layouts.
pub const JOB_LISTING_LABEL: &str = "Job listing";

static HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2").expect("invalid selector"));

/// Result of extracting a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Normalized listing text; empty when nothing could be extracted.
    pub text: String,
    /// Element to capture instead of the full page.
    pub screenshot_selector: Option<String>,
}

impl Extraction {
    pub fn new(text: impl Into<String>, screenshot_selector: Option<String>) -> Self {
        Self { text: text.into(), screenshot_selector }
    }

    /// The result reported when fetching or parsing failed.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Page-layout specific extraction.
pub trait Extractor: Send + Sync {
    /// Site kind this extractor handles.
    fn kind(&self) -> SiteKind;

    /// Extract the listing text from a page.
    fn extract(&self, html: &str) -> Result<Extraction, Error>;
}

static REZOOMO: RezoomoExtractor = RezoomoExtractor;
static OCCUPOP: OccupopExtractor = OccupopExtractor;

/// Extractor registered for `kind`.
pub fn extractor_for(kind: SiteKind) -> &'static dyn Extractor {
    match kind {
        SiteKind::Rezoomo => &REZOOMO,
        SiteKind::Occupop => &OCCUPOP,
    }
}

/// Text nodes trimmed, blanks dropped, joined with single spaces.
pub fn joined_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text nodes trimmed and concatenated without a separator.
pub fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// First `h2` whose text is `label`, optionally requiring a class attribute
/// containing `class_hint`.
pub(crate) fn find_heading<'a>(document: &'a Html, label: &str, class_hint: Option<&str>) -> Option<ElementRef<'a>> {
    document.select(&HEADING).find(|h2| {
        joined_text(*h2) == label
            && class_hint.is_none_or(|hint| h2.value().attr("class").is_some_and(|class| class.contains(hint)))
    })
}

/// Closest `div` enclosing `element`.
pub(crate) fn nearest_div(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "div")
}

/// `div.class1.class2` selector for a div, or `None` if it has no classes.
pub(crate) fn div_selector(div: ElementRef<'_>) -> Option<String> {
    let classes: Vec<String> = div
        .value()
        .attr("class")
        .unwrap_or_default()
        .split_whitespace()
        .map(escape_class)
        .collect();
    if classes.is_empty() {
        return None;
    }
    Some(format!("div.{}", classes.join(".")))
}

/// Escape a class name for use in a CSS compound selector.
fn escape_class(class: &str) -> String {
    let mut escaped = String::with_capacity(class.len());
    for (i, c) in class.chars().enumerate() {
        if i == 0 && c.is_ascii_digit() {
            escaped.push_str(&format!("\\{:x} ", c as u32));
            continue;
        }
        if !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_for_each_kind() {
        for kind in SiteKind::ALL {
            assert_eq!(extractor_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_joined_and_stripped_text() {
        let html = Html::parse_fragment("<div> <p> Staff  Nurse </p>\n <span>Dublin</span> </div>");
        let div = html.select(&Selector::parse("div").unwrap()).next().unwrap();
        assert_eq!(joined_text(div), "Staff  Nurse Dublin");
        assert_eq!(stripped_text(div), "Staff  NurseDublin");
    }

    #[test]
    fn test_find_heading_with_class_hint() {
        let html = Html::parse_document(
            r#"<h2 class="title">Job listing</h2><h2 class="css-1ab2">Job listing</h2><h2>Other</h2>"#,
        );
        let plain = find_heading(&html, JOB_LISTING_LABEL, None).unwrap();
        assert_eq!(plain.value().attr("class"), Some("title"));

        let hinted = find_heading(&html, JOB_LISTING_LABEL, Some("css")).unwrap();
        assert_eq!(hinted.value().attr("class"), Some("css-1ab2"));

        assert!(find_heading(&html, "Missing", None).is_none());
    }

    #[test]
    fn test_div_selector() {
        let html = Html::parse_document(
            r#"<div class="jobs-wrapper col-12"><section><h2>Job listing</h2></section></div>"#,
        );
        let heading = find_heading(&html, JOB_LISTING_LABEL, None).unwrap();
        let div = nearest_div(heading).unwrap();
        assert_eq!(div_selector(div).as_deref(), Some("div.jobs-wrapper.col-12"));
    }

    #[test]
    fn test_div_selector_without_classes() {
        let html = Html::parse_document("<div><h2>Job listing</h2></div>");
        let heading = find_heading(&html, JOB_LISTING_LABEL, None).unwrap();
        assert!(div_selector(nearest_div(heading).unwrap()).is_none());
    }

    #[test]
    fn test_escape_class() {
        assert_eq!(escape_class("md:flex"), "md\\:flex");
        assert_eq!(escape_class("1col"), "\\31 col");
        assert_eq!(escape_class("css-1x2y_z"), "css-1x2y_z");
    }

    #[test]
    fn test_extraction_is_empty() {
        assert!(Extraction::empty().is_empty());
        assert!(Extraction::new("  \n", None).is_empty());
        assert!(!Extraction::new("Staff Nurse", None).is_empty());
    }
}
