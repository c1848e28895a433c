//! Mirrored catalog access
//!
//! Branch selection, candidate metadata loading, compose image extraction
//! and the engine-injected images that live outside the catalog.

pub mod auxiliary;
pub mod branch;
pub mod compose;
pub mod metadata;
pub mod mirror;

pub use auxiliary::AuxiliaryImages;
pub use branch::{BranchRule, BranchSelector, catalog_branch};
pub use compose::ComposeImageExtractor;
pub use metadata::{Component, list_components, load_candidate, load_component, load_preferred};
pub use mirror::LocalMirror;
