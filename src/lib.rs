//! Release Images Library
//!
//! Keeps a tag-to-digest index of a container registry repository fresh,
//! maps moving tags onto the release they alias, and resolves which catalog
//! directory of each component applies to that release.

pub mod catalog;
pub mod cli;
pub mod common;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod sync;

pub use config::AppConfig;
pub use error::{ResolverError, Result};
pub use logging::Logger;
pub use resolver::{CandidateDirectory, DirectorySelection, VersionRange, resolve_version_directory};
pub use service::{ImageService, ImageSet};
pub use sync::{SyncEngine, SyncReport};
