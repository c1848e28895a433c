//! Catalog branch selection for a release line
//!
//! Rules are comma-separated comparators (`>1.6.0, <2.0.0`). They compare the
//! full version by semver precedence, so a pre-release sorts below its
//! release: `2.0.0-rc1` is still on the 1.6 line.

use crate::error::{ResolverError, Result};
use crate::resolver::range::precedence;
use semver::Version;
use std::cmp::Ordering;

const STANDARD_RULES: &[(&str, &str)] = &[
    (">1.6.0, <2.0.0", "v1.6-release"),
    (">=2.0.0", "v2.0-release"),
];
const STANDARD_FALLBACK: &str = "master";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Exact,
}

#[derive(Debug, Clone)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let (op, rest) = if let Some(rest) = text.strip_prefix(">=") {
            (Op::GreaterEq, rest)
        } else if let Some(rest) = text.strip_prefix("<=") {
            (Op::LessEq, rest)
        } else if let Some(rest) = text.strip_prefix('>') {
            (Op::Greater, rest)
        } else if let Some(rest) = text.strip_prefix('<') {
            (Op::Less, rest)
        } else if let Some(rest) = text.strip_prefix('=') {
            (Op::Exact, rest)
        } else {
            (Op::Exact, text)
        };

        let version = Version::parse(rest.trim()).map_err(|e| {
            ResolverError::Config(format!("Invalid branch rule comparator '{}': {}", text, e))
        })?;
        Ok(Self { op, version })
    }

    fn matches(&self, version: &Version) -> bool {
        let order = precedence(version, &self.version);
        match self.op {
            Op::Greater => order == Ordering::Greater,
            Op::GreaterEq => order != Ordering::Less,
            Op::Less => order == Ordering::Less,
            Op::LessEq => order != Ordering::Greater,
            Op::Exact => order == Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BranchRule {
    pub requirement: String,
    pub branch: String,
    comparators: Vec<Comparator>,
}

impl BranchRule {
    pub fn parse(requirement: &str, branch: &str) -> Result<Self> {
        let comparators = requirement
            .split(',')
            .map(Comparator::parse)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            requirement: requirement.to_string(),
            branch: branch.to_string(),
            comparators,
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.comparators.iter().all(|c| c.matches(version))
    }
}

/// First matching rule wins; versions matching no rule use the fallback branch
#[derive(Debug, Clone)]
pub struct BranchSelector {
    rules: Vec<BranchRule>,
    fallback: String,
}

impl BranchSelector {
    pub fn new(rules: &[(&str, &str)], fallback: &str) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|(requirement, branch)| BranchRule::parse(requirement, branch))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            fallback: fallback.to_string(),
        })
    }

    pub fn standard() -> Result<Self> {
        Self::new(STANDARD_RULES, STANDARD_FALLBACK)
    }

    pub fn branch_for(&self, version: &Version) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.matches(version))
            .map(|rule| rule.branch.as_str())
            .unwrap_or(&self.fallback)
    }
}

/// Catalog branch under the standard rules
pub fn catalog_branch(version: &Version) -> Result<String> {
    Ok(BranchSelector::standard()?.branch_for(version).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Version {
        Version::parse(text).unwrap()
    }

    #[test]
    fn test_standard_branches() {
        let selector = BranchSelector::standard().unwrap();
        assert_eq!(selector.branch_for(&v("1.6.10")), "v1.6-release");
        assert_eq!(selector.branch_for(&v("1.6.0")), "master");
        assert_eq!(selector.branch_for(&v("1.5.3")), "master");
        assert_eq!(selector.branch_for(&v("2.0.0")), "v2.0-release");
        assert_eq!(selector.branch_for(&v("2.3.1")), "v2.0-release");
    }

    #[test]
    fn test_prerelease_sorts_below_its_release() {
        let selector = BranchSelector::standard().unwrap();
        // 2.0.0-rc1 < 2.0.0, so it still satisfies "<2.0.0"
        assert_eq!(selector.branch_for(&v("2.0.0-rc1")), "v1.6-release");
        assert_eq!(selector.branch_for(&v("2.1.0-rc2")), "v2.0-release");
        assert_eq!(selector.branch_for(&v("1.6.5-rc1")), "v1.6-release");
        // 1.6.0-rc1 < 1.6.0, so it misses ">1.6.0"
        assert_eq!(selector.branch_for(&v("1.6.0-rc1")), "master");
    }

    #[test]
    fn test_comparator_operators() {
        let rule = BranchRule::parse(">=1.2.0, <=1.4.0", "b").unwrap();
        assert!(rule.matches(&v("1.2.0")));
        assert!(rule.matches(&v("1.4.0")));
        assert!(!rule.matches(&v("1.4.1")));
        assert!(!rule.matches(&v("1.2.0-alpha")));

        let exact = BranchRule::parse("=1.3.0", "b").unwrap();
        assert!(exact.matches(&v("1.3.0+build.7")));
        assert!(!exact.matches(&v("1.3.1")));
    }

    #[test]
    fn test_catalog_branch() {
        assert_eq!(catalog_branch(&Version::new(1, 6, 3)).unwrap(), "v1.6-release");
        assert_eq!(catalog_branch(&Version::new(0, 9, 0)).unwrap(), "master");
    }

    #[test]
    fn test_invalid_rule_is_rejected() {
        assert!(BranchSelector::new(&[("not a req", "x")], "master").is_err());
        assert!(BranchSelector::new(&[(">1.6.0, ", "x")], "master").is_err());
    }
}
