//! Candidate directory selection
//!
//! Picks exactly one packaged-release directory of a component for a target
//! version: filter by range, then take the only survivor, else the
//! preferred declared version, else the numerically largest integer name.

use crate::resolver::range::VersionRange;
use semver::Version;
use serde::Serialize;

/// Declared version reported when no directory can be selected
pub const UNAVAILABLE: &str = "unavailable";

/// One packaged release variant of a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDirectory {
    pub name: String,
    pub declared_version: String,
    pub range: VersionRange,
}

impl CandidateDirectory {
    pub fn new(name: impl Into<String>, declared_version: impl Into<String>, range: VersionRange) -> Self {
        Self {
            name: name.into(),
            declared_version: declared_version.into(),
            range,
        }
    }

    /// Integer value of the directory name, when it is one
    pub fn ordinal(&self) -> Option<u64> {
        self.name.parse::<u64>().ok()
    }
}

/// Which rule produced a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    OnlyMatch,
    Preferred,
    HighestOrdinal,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectorySelection {
    pub name: String,
    pub declared_version: String,
    pub rule: SelectionRule,
}

impl DirectorySelection {
    fn pick(candidate: &CandidateDirectory, rule: SelectionRule) -> Self {
        Self {
            name: candidate.name.clone(),
            declared_version: candidate.declared_version.clone(),
            rule,
        }
    }

    /// The failure sentinel: empty name, declared version "unavailable"
    pub fn unavailable() -> Self {
        Self {
            name: String::new(),
            declared_version: UNAVAILABLE.to_string(),
            rule: SelectionRule::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        self.rule != SelectionRule::Unavailable
    }
}

/// Candidates whose range admits `target`, sorted by name
pub fn filter_candidates<'a>(
    target: &Version,
    candidates: &'a [CandidateDirectory],
) -> Vec<&'a CandidateDirectory> {
    let mut remaining: Vec<&CandidateDirectory> = candidates
        .iter()
        .filter(|c| c.range.contains(target))
        .collect();
    remaining.sort_by(|a, b| a.name.cmp(&b.name));
    remaining
}

pub fn resolve_version_directory(
    target: &Version,
    candidates: &[CandidateDirectory],
    preferred: Option<&str>,
) -> DirectorySelection {
    let remaining = filter_candidates(target, candidates);

    if let [only] = remaining.as_slice() {
        return DirectorySelection::pick(only, SelectionRule::OnlyMatch);
    }

    if let Some(preferred) = preferred.filter(|p| !p.is_empty()) {
        if let Some(candidate) = remaining
            .iter()
            .find(|c| c.declared_version == preferred)
        {
            return DirectorySelection::pick(candidate, SelectionRule::Preferred);
        }
    }

    // Equal ordinals ("7" and "07") fall back to the lexically smaller name
    remaining
        .iter()
        .filter_map(|c| c.ordinal().map(|n| (n, *c)))
        .max_by(|(a, ca), (b, cb)| a.cmp(b).then_with(|| cb.name.cmp(&ca.name)))
        .map(|(_, c)| DirectorySelection::pick(c, SelectionRule::HighestOrdinal))
        .unwrap_or_else(DirectorySelection::unavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::range::parse_release_version;

    fn v(text: &str) -> Version {
        parse_release_version(text).unwrap()
    }

    fn candidate(name: &str, declared: &str, min: Option<&str>, max: Option<&str>) -> CandidateDirectory {
        CandidateDirectory::new(name, declared, VersionRange::from_bounds(min, max))
    }

    #[test]
    fn test_range_examples() {
        let candidates = vec![
            candidate("1", "v0.1.0", Some("1.0.0"), Some("1.9.9")),
            candidate("2", "v0.2.0", Some("2.0.0"), None),
        ];

        let selection = resolve_version_directory(&v("1.5.0"), &candidates, None);
        assert_eq!(selection.name, "1");
        assert_eq!(selection.declared_version, "v0.1.0");
        assert_eq!(selection.rule, SelectionRule::OnlyMatch);

        assert_eq!(resolve_version_directory(&v("2.3.0"), &candidates, None).name, "2");

        let none = resolve_version_directory(&v("0.9.0"), &candidates, None);
        assert_eq!(none, DirectorySelection::unavailable());
        assert_eq!(none.name, "");
        assert_eq!(none.declared_version, "unavailable");
        assert!(!none.is_available());
    }

    #[test]
    fn test_preferred_declared_version_wins_over_ordinal() {
        let candidates = vec![
            candidate("9", "a", None, None),
            candidate("3", "b", None, None),
        ];
        let selection = resolve_version_directory(&v("1.0.0"), &candidates, Some("b"));
        assert_eq!(selection.name, "3");
        assert_eq!(selection.rule, SelectionRule::Preferred);
    }

    #[test]
    fn test_highest_ordinal_when_no_preferred_match() {
        let candidates = vec![
            candidate("3", "x", None, None),
            candidate("7", "y", None, None),
        ];
        let selection = resolve_version_directory(&v("1.0.0"), &candidates, Some("z"));
        assert_eq!(selection.name, "7");
        assert_eq!(selection.rule, SelectionRule::HighestOrdinal);

        let selection = resolve_version_directory(&v("1.0.0"), &candidates, None);
        assert_eq!(selection.name, "7");
    }

    #[test]
    fn test_ordinal_compares_numerically() {
        let candidates = vec![
            candidate("9", "a", None, None),
            candidate("10", "b", None, None),
            candidate("draft", "c", None, None),
        ];
        assert_eq!(resolve_version_directory(&v("1.0.0"), &candidates, None).name, "10");
    }

    #[test]
    fn test_equal_ordinals_pick_smaller_name() {
        let candidates = vec![
            candidate("07", "a", None, None),
            candidate("7", "b", None, None),
        ];
        assert_eq!(resolve_version_directory(&v("1.0.0"), &candidates, None).name, "07");
    }

    #[test]
    fn test_no_integer_names_is_unavailable() {
        let candidates = vec![
            candidate("alpha", "a", None, None),
            candidate("beta", "b", None, None),
        ];
        let selection = resolve_version_directory(&v("1.0.0"), &candidates, None);
        assert!(!selection.is_available());
        assert_eq!(selection.declared_version, UNAVAILABLE);
    }

    #[test]
    fn test_filter_excludes_before_tie_break() {
        let candidates = vec![
            candidate("3", "a", Some("1.0.0"), None),
            candidate("12", "b", Some("3.0.0"), None),
            candidate("5", "c", None, Some("1.9.0")),
        ];
        let remaining: Vec<&str> = filter_candidates(&v("1.5.0"), &candidates)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(remaining, vec!["3", "5"]);
        assert_eq!(resolve_version_directory(&v("1.5.0"), &candidates, None).name, "5");
    }

    #[test]
    fn test_empty_preferred_is_ignored() {
        let candidates = vec![
            candidate("1", "", None, None),
            candidate("2", "x", None, None),
        ];
        let selection = resolve_version_directory(&v("1.0.0"), &candidates, Some(""));
        assert_eq!(selection.name, "2");
        assert_eq!(selection.rule, SelectionRule::HighestOrdinal);
    }

    #[test]
    fn test_negative_name_is_not_an_ordinal() {
        assert_eq!(candidate("-1", "a", None, None).ordinal(), None);
        assert_eq!(candidate("42", "a", None, None).ordinal(), Some(42));
    }
}
