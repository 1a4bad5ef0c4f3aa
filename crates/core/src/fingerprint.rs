//! Content fingerprints for change detection.

use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded SHA-256 digest of extracted page text.
///
/// Two fingerprints compare equal iff the text they were computed from was
/// byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a piece of extracted text.
    pub fn of(text: &str) -> Self {
        fingerprint(text)
    }

    /// Wrap a digest previously written to the registry.
    ///
    /// Stored values are taken as-is: digests written by older deployments
    /// (e.g. MD5) simply never match and trigger one change notification.
    pub fn from_stored(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of `text`.
pub fn fingerprint(text: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    Fingerprint(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_stability() {
        let a = fingerprint("01/10/2025 | Staff Nurse | Dublin | Full Time");
        let b = fingerprint("01/10/2025 | Staff Nurse | Dublin | Full Time");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_differs_on_any_byte() {
        let a = fingerprint("Job listing Staff Nurse");
        let b = fingerprint("Job listing Staff Nurse ");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = fingerprint("anything");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_known_vector() {
        assert_eq!(
            fingerprint("").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_from_stored_round_trips_display() {
        let fp = Fingerprint::from_stored("d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(fp.to_string(), "d41d8cd98f00b204e9800998ecf8427e");
        assert_ne!(fp, Fingerprint::of(""));
    }
}
