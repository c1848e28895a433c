//! Common traits at the seams between the engine and external services
//!
//! The sync engine and token manager depend only on these traits, so the
//! HTTP implementations in [`crate::registry`] and the catalog readers in
//! [`crate::catalog`] can be swapped for in-memory fakes in tests.

use crate::error::Result;
use crate::registry::auth::Token;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Issues bearer tokens for a fixed scope
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Perform one token issuance call. No retry.
    async fn issue_token(&self) -> Result<Token>;
}

/// Read-only view of a registry repository's tags and manifests
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Full tag list of the tracked repository
    async fn list_tags(&self) -> Result<Vec<String>>;

    /// Content digest of the manifest a tag points to (metadata-only request)
    async fn manifest_digest(&self, tag: &str) -> Result<String>;
}

/// Provides an on-disk checkout of the catalog for a branch
#[async_trait]
pub trait CatalogMirror: Send + Sync {
    /// Root directory of the checked-out branch
    async fn checkout(&self, branch: &str) -> Result<PathBuf>;
}

/// Extracts image references from a selected candidate directory
pub trait ImageExtractor: Send + Sync {
    fn images(&self, version_dir: &Path) -> Result<Vec<String>>;
}
