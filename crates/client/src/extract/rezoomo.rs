//! Rezoomo company job boards.
//!
//! Newer boards embed their data as `window.initData = {...}` in a script
//! tag; older ones render one `div.job-block` per vacancy. Screenshots are
//! scoped to the `div` around the "Job listing" heading when it exists.

use std::sync::LazyLock;

use jobwatch_core::{Error, SiteKind};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::{Extraction, Extractor, JOB_LISTING_LABEL, div_selector, find_heading, nearest_div, stripped_text};

static SCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").expect("invalid selector"));
static JOB_BLOCK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.job-block").expect("invalid selector"));
static DATE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.date-field").expect("invalid selector"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p.jobTitle").expect("invalid selector"));
static LOCATION_ICON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("i.fa-map-marker-alt").expect("invalid selector"));
static CLOCK_ICON: LazyLock<Selector> = LazyLock::new(|| Selector::parse("i.fa-clock").expect("invalid selector"));

static INIT_DATA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"window\.initData\s*=\s*").expect("invalid regex"));

/// Extractor for Rezoomo job boards.
#[derive(Debug, Clone, Copy, Default)]
pub struct RezoomoExtractor;

impl Extractor for RezoomoExtractor {
    fn kind(&self) -> SiteKind {
        SiteKind::Rezoomo
    }

    fn extract(&self, html: &str) -> Result<Extraction, Error> {
        let document = Html::parse_document(html);

        let text = match init_data(&document) {
            Some(payload) => payload,
            None => document
                .select(&JOB_BLOCK)
                .map(job_block_line)
                .collect::<Vec<_>>()
                .join(" "),
        };

        let selector = find_heading(&document, JOB_LISTING_LABEL, None)
            .and_then(nearest_div)
            .and_then(div_selector);

        Ok(Extraction::new(text, selector))
    }
}

/// Listing data assigned to `window.initData`, if the page embeds it.
///
/// JSON payloads are re-serialized with sorted keys; when the payload has a
/// `jobs` entry only that part is kept so unrelated page state does not
/// register as a change.
fn init_data(document: &Html) -> Option<String> {
    let script = document
        .select(&SCRIPT)
        .map(|s| s.text().collect::<String>())
        .find(|text| text.contains("window.initData"))?;

    let payload = INIT_DATA
        .find(&script)
        .map(|m| &script[m.end()..])
        .unwrap_or_default()
        .trim();

    let mut values = serde_json::Deserializer::from_str(payload).into_iter::<Value>();
    let text = match values.next() {
        Some(Ok(value)) => find_key(&value, "jobs").unwrap_or(&value).to_string(),
        _ => payload.trim_end_matches(';').trim().to_string(),
    };

    if text.is_empty() { None } else { Some(text) }
}

/// Depth-first search for the first object entry named `key`.
fn find_key<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_key(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

/// `date | title | location | type` for one vacancy; missing parts are empty.
fn job_block_line(block: ElementRef<'_>) -> String {
    let date = block.select(&DATE).next().map(stripped_text).unwrap_or_default();
    let title = block.select(&TITLE).next().map(stripped_text).unwrap_or_default();
    let location = icon_label(block, &LOCATION_ICON);
    let job_type = icon_label(block, &CLOCK_ICON);

    format!("{date} | {title} | {location} | {job_type}")
}

/// Text of the element wrapping an icon, e.g. `<span><i class="fa-clock"></i> Full time</span>`.
fn icon_label(block: ElementRef<'_>, icon: &Selector) -> String {
    block
        .select(icon)
        .next()
        .and_then(|i| i.parent())
        .and_then(ElementRef::wrap)
        .map(stripped_text)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCKS: &str = r#"
        <html><body>
        <div class="company-jobs">
            <h2>Job listing</h2>
            <div class="job-block">
                <div class="date-field"> 01 Oct 2025 </div>
                <p class="jobTitle">Staff Midwife</p>
                <span><i class="fas fa-map-marker-alt"></i> Holles Street, Dublin 2</span>
                <span><i class="far fa-clock"></i> Permanent Full Time</span>
            </div>
            <div class="job-block">
                <div class="date-field">28 Sep 2025</div>
                <p class="jobTitle">Porter</p>
            </div>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_extract_job_blocks() {
        let extraction = RezoomoExtractor.extract(BLOCKS).unwrap();
        assert_eq!(
            extraction.text,
            "01 Oct 2025 | Staff Midwife | Holles Street, Dublin 2 | Permanent Full Time 28 Sep 2025 | Porter |  | "
        );
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let html = r#"<div class="job-block"><p class="jobTitle">Porter</p></div>"#;
        let extraction = RezoomoExtractor.extract(html).unwrap();
        assert_eq!(extraction.text, " | Porter |  | ");
    }

    #[test]
    fn test_screenshot_selector_from_heading() {
        let extraction = RezoomoExtractor.extract(BLOCKS).unwrap();
        assert_eq!(extraction.screenshot_selector.as_deref(), Some("div.company-jobs"));
    }

    #[test]
    fn test_no_heading_means_full_page() {
        let html = r#"<div class="job-block"><p class="jobTitle">Porter</p></div>"#;
        let extraction = RezoomoExtractor.extract(html).unwrap();
        assert!(extraction.screenshot_selector.is_none());
    }

    #[test]
    fn test_init_data_jobs_are_preferred() {
        let html = r#"
            <html><head><script>
                window.initData = {"csrf": "abc", "company": {"jobs": [{"title": "Staff Midwife", "id": 7}]}};
                window.other = 1;
            </script></head><body><div class="job-block"><p class="jobTitle">Ignored</p></div></body></html>
        "#;
        let extraction = RezoomoExtractor.extract(html).unwrap();
        assert_eq!(extraction.text, r#"[{"id":7,"title":"Staff Midwife"}]"#);
    }

    #[test]
    fn test_init_data_changes_are_visible() {
        let before = r#"<script>window.initData = {"jobs": [{"title": "Porter"}]};</script>"#;
        let after = r#"<script>window.initData = {"jobs": [{"title": "Porter"}, {"title": "Chef"}]};</script>"#;
        let a = RezoomoExtractor.extract(before).unwrap();
        let b = RezoomoExtractor.extract(after).unwrap();
        assert_ne!(a.text, b.text);
    }

    #[test]
    fn test_init_data_key_order_does_not_matter() {
        let a = r#"<script>window.initData = {"a": 1, "b": 2};</script>"#;
        let b = r#"<script>window.initData = { "b": 2, "a": 1 };</script>"#;
        assert_eq!(RezoomoExtractor.extract(a).unwrap().text, RezoomoExtractor.extract(b).unwrap().text);
    }

    #[test]
    fn test_init_data_not_json() {
        let html = r#"<script>window.initData = loadJobs("nmh");</script>"#;
        let extraction = RezoomoExtractor.extract(html).unwrap();
        assert_eq!(extraction.text, r#"loadJobs("nmh")"#);
    }

    #[test]
    fn test_empty_board() {
        let extraction = RezoomoExtractor.extract("<html><body><p>No vacancies</p></body></html>").unwrap();
        assert!(extraction.is_empty());
    }
}
