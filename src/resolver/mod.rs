//! Version-constrained directory resolution

pub mod range;
pub mod select;

pub use range::{VersionRange, parse_bound, parse_release_version};
pub use select::{
    CandidateDirectory, DirectorySelection, SelectionRule, UNAVAILABLE, filter_candidates,
    resolve_version_directory,
};
