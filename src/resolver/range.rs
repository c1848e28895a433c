//! Release versions and compatibility ranges
//!
//! Release tags and range bounds may carry a leading `v`. Bounds that fail
//! to parse are treated as absent, so a malformed bound widens a range
//! instead of failing the resolution.

use crate::error::{ResolverError, Result};
use semver::Version;
use std::cmp::Ordering;
use std::fmt;

/// Parse a release tag such as `v1.6.10` as a semantic version
pub fn parse_release_version(text: &str) -> Result<Version> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ResolverError::InvalidVersion {
            tag: text.to_string(),
            message: "empty version".to_string(),
        });
    }

    Version::parse(trimmed.strip_prefix('v').unwrap_or(trimmed)).map_err(|e| {
        ResolverError::InvalidVersion {
            tag: text.to_string(),
            message: e.to_string(),
        }
    })
}

/// Lenient bound parsing: empty or malformed text means "no bound"
pub fn parse_bound(text: Option<&str>) -> Option<Version> {
    text.and_then(|t| parse_release_version(t).ok())
}

/// Semantic-version precedence; build metadata does not take part
pub fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

/// Inclusive range with optional bounds on either side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRange {
    pub min: Option<Version>,
    pub max: Option<Version>,
}

impl VersionRange {
    pub fn new(min: Option<Version>, max: Option<Version>) -> Self {
        Self { min, max }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn from_bounds(min: Option<&str>, max: Option<&str>) -> Self {
        Self {
            min: parse_bound(min),
            max: parse_bound(max),
        }
    }

    /// `version` is excluded only when strictly below `min` or strictly above `max`
    pub fn contains(&self, version: &Version) -> bool {
        let above_min = self
            .min
            .as_ref()
            .is_none_or(|min| precedence(version, min) != Ordering::Less);
        let below_max = self
            .max
            .as_ref()
            .is_none_or(|max| precedence(version, max) != Ordering::Greater);
        above_min && below_max
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => write!(f, "[{}, {}]", min, max),
            (Some(min), None) => write!(f, "[{}, ∞)", min),
            (None, Some(max)) => write!(f, "(-∞, {}]", max),
            (None, None) => write!(f, "(-∞, ∞)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Version {
        parse_release_version(text).unwrap()
    }

    #[test]
    fn test_parse_release_version() {
        assert_eq!(v("v1.6.10"), Version::new(1, 6, 10));
        assert_eq!(v("2.0.0"), Version::new(2, 0, 0));
        assert_eq!(v("v2.0.0-beta3").pre.as_str(), "beta3");
        assert!(matches!(
            parse_release_version(""),
            Err(ResolverError::InvalidVersion { .. })
        ));
        assert!(parse_release_version("latest").is_err());
        assert!(parse_release_version("v1.6").is_err());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let range = VersionRange::from_bounds(Some("v1.0.0"), Some("v1.9.9"));
        assert!(range.contains(&v("1.0.0")));
        assert!(range.contains(&v("1.5.0")));
        assert!(range.contains(&v("1.9.9")));
        assert!(!range.contains(&v("0.9.0")));
        assert!(!range.contains(&v("2.0.0")));
    }

    #[test]
    fn test_malformed_bound_is_unbounded() {
        let range = VersionRange::from_bounds(Some("not-a-version"), Some("v1.2"));
        assert_eq!(range, VersionRange::unbounded());
        assert!(range.contains(&v("0.0.1")));
        assert!(range.contains(&v("99.0.0")));

        let range = VersionRange::from_bounds(Some(""), Some("v2.0.0"));
        assert!(range.min.is_none());
        assert!(range.contains(&v("0.1.0")));
        assert!(!range.contains(&v("2.0.1")));
    }

    #[test]
    fn test_prerelease_precedence() {
        let range = VersionRange::from_bounds(Some("v2.0.0"), None);
        assert!(!range.contains(&v("2.0.0-rc1")));
        assert!(range.contains(&v("2.0.0")));
        assert!(range.contains(&v("2.0.1-rc1")));
    }

    #[test]
    fn test_build_metadata_ignored() {
        let range = VersionRange::from_bounds(None, Some("v1.6.10"));
        assert!(range.contains(&v("1.6.10+build.7")));
    }

    #[test]
    fn test_widening_never_excludes() {
        let ranges = [
            VersionRange::from_bounds(Some("1.0.0"), Some("1.9.9")),
            VersionRange::from_bounds(Some("2.0.0"), None),
            VersionRange::from_bounds(None, Some("1.4.0")),
        ];
        let versions = ["0.9.0", "1.0.0", "1.4.0", "1.5.0", "1.9.9", "2.0.0", "2.3.0"];

        for range in &ranges {
            let widened = [
                VersionRange::new(None, range.max.clone()),
                VersionRange::new(range.min.clone(), None),
                VersionRange::unbounded(),
            ];
            for text in versions {
                let version = v(text);
                if range.contains(&version) {
                    for wider in &widened {
                        assert!(wider.contains(&version), "{} lost from {}", text, wider);
                    }
                }
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            VersionRange::from_bounds(Some("1.0.0"), Some("1.9.9")).to_string(),
            "[1.0.0, 1.9.9]"
        );
        assert_eq!(VersionRange::from_bounds(Some("2.0.0"), None).to_string(), "[2.0.0, ∞)");
    }
}
