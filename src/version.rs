// src/version.rs

//! Loose version parsing and comparison
//!
//! Recipe versions ("0.186") and compiler versions ("9", "12.0.1") are not
//! guaranteed to be semver-compliant. Comparison normalizes both sides to
//! semver by extracting the leading numeric segments, so "9" and "9.0.0"
//! order equal while "0.185" sorts below "0.186".

use crate::error::{Error, Result};
use semver::Version as SemverVersion;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A loosely formatted version string with numeric ordering
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    original: String,
}

impl Version {
    /// Parse a version string
    ///
    /// Any non-empty string is accepted; ordering is numeric where the
    /// string allows it.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::ParseError("empty version string".to_string()));
        }
        Ok(Self {
            original: s.to_string(),
        })
    }

    /// The version exactly as declared
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Normalize to a semver version for comparison
    ///
    /// If the string parses as semver, use it directly; otherwise extract
    /// major.minor.patch from the leading dotted numeric segments.
    fn to_semver(&self) -> SemverVersion {
        if let Ok(v) = SemverVersion::parse(&self.original) {
            return v;
        }

        let parts: Vec<&str> = self.original.split('.').collect();
        let major = parts
            .first()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        let minor = parts.get(1).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);
        let patch = parts.get(2).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);

        SemverVersion::new(major, minor, patch)
    }

    /// Compare two versions by their numeric segments
    pub fn compare(&self, other: &Version) -> Ordering {
        self.to_semver().cmp(&other.to_semver())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_empty() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("   ").is_err());
    }

    #[test]
    fn test_parse_keeps_original() {
        let v = Version::parse("0.186").unwrap();
        assert_eq!(v.as_str(), "0.186");
        assert_eq!(v.to_string(), "0.186");
    }

    #[test]
    fn test_compare_dotted() {
        let a = Version::parse("0.185").unwrap();
        let b = Version::parse("0.186").unwrap();
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&a), Ordering::Greater);
    }

    #[test]
    fn test_compare_single_segment() {
        let nine = Version::parse("9").unwrap();
        let ten = Version::parse("10").unwrap();
        assert!(nine < ten);
    }

    #[test]
    fn test_compare_mixed_lengths() {
        let short = Version::parse("9").unwrap();
        let long = Version::parse("9.0.0").unwrap();
        assert_eq!(short.compare(&long), Ordering::Equal);

        let newer = Version::parse("12.0.1").unwrap();
        let older = Version::parse("12").unwrap();
        assert!(newer > older);
    }

    #[test]
    fn test_compare_semver_passthrough() {
        let a = Version::parse("1.2.3").unwrap();
        let b = Version::parse("1.10.0").unwrap();
        assert!(a < b);
    }
}
