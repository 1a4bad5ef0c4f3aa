//! Validation of monitored URLs before they are fetched.

/// Error type for URLs that cannot be fetched.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse a registry URL into the form that is requested.
///
/// Registry URLs are absolute; surrounding whitespace is trimmed, only
/// http(s) is accepted, and the fragment is dropped since it never reaches
/// the server. The query string is kept verbatim because job boards use it
/// to select the embedded layout (e.g. `?source=iframe`).
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_keeps_query() {
        let url = canonicalize("https://www.rezoomo.com/company/coombe-hospital/jobs/?source=iframe").unwrap();
        assert_eq!(url.path(), "/company/coombe-hospital/jobs/");
        assert_eq!(url.query(), Some("source=iframe"));
    }

    #[test]
    fn test_canonicalize_lowercases_host() {
        let url = canonicalize("https://TheRotundaHospital.occupop-careers.com/").unwrap();
        assert_eq!(url.host_str(), Some("therotundahospital.occupop-careers.com"));
    }

    #[test]
    fn test_canonicalize_drops_fragment() {
        let url = canonicalize("  https://example.com/jobs#open  ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/jobs");
    }

    #[test]
    fn test_canonicalize_requires_scheme() {
        assert!(matches!(canonicalize("example.com/jobs"), Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        assert!(matches!(canonicalize("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }
}
