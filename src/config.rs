//! Configuration module for registry, sync, catalog and auxiliary settings
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `RELEASE_IMAGES_*` environment variables, then command-line flags.

use crate::error::handlers::ValidationErrorHandler;
use crate::error::{ResolverError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PRERELEASE_PATTERN: &str = "-rc[0-9]+$";
pub const DEFAULT_BATCH_WIDTH: usize = 128;

/// Registry endpoints and the repository whose tags are tracked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub url: String,
    pub auth_url: String,
    pub service: String,
    pub repository: String,
    /// Seconds before expiry at which a token is considered stale
    pub token_margin_secs: u64,
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "https://registry-1.docker.io".to_string(),
            auth_url: "https://auth.docker.io/token".to_string(),
            service: "registry.docker.io".to_string(),
            repository: "rancher/server".to_string(),
            token_margin_secs: 30,
            timeout_secs: 10,
        }
    }
}

impl RegistryConfig {
    pub fn scope(&self) -> String {
        format!("repository:{}:pull", self.repository)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn token_margin(&self) -> Duration {
        Duration::from_secs(self.token_margin_secs)
    }
}

/// Sync engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub include_prerelease: bool,
    pub prerelease_pattern: String,
    pub interval_secs: u64,
    /// Number of digest lookups in flight per batch
    pub batch_width: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            include_prerelease: false,
            prerelease_pattern: DEFAULT_PRERELEASE_PATTERN.to_string(),
            interval_secs: 12 * 60 * 60,
            batch_width: DEFAULT_BATCH_WIDTH,
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Location of the mirrored catalog tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub root: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("catalog"),
        }
    }
}

/// Raw-content URL templates; `{version}` is substituted per request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuxiliaryConfig {
    pub build_file_url: Option<String>,
    pub properties_url: Option<String>,
}

impl AuxiliaryConfig {
    pub fn is_enabled(&self) -> bool {
        self.build_file_url.is_some() && self.properties_url.is_some()
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub registry: RegistryConfig,
    pub sync: SyncConfig,
    pub catalog: CatalogConfig,
    pub auxiliary: AuxiliaryConfig,
    pub verbose: bool,
}

impl AppConfig {
    /// Load a JSON configuration file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ResolverError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
            ResolverError::Config(format!("Cannot parse {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    /// Override values from `RELEASE_IMAGES_*` environment variables
    pub fn with_env(mut self) -> Self {
        if let Ok(val) = std::env::var("RELEASE_IMAGES_REGISTRY_URL") {
            self.registry.url = val;
        }
        if let Ok(val) = std::env::var("RELEASE_IMAGES_AUTH_URL") {
            self.registry.auth_url = val;
        }
        if let Ok(val) = std::env::var("RELEASE_IMAGES_REPOSITORY") {
            self.registry.repository = val;
        }
        if let Ok(val) = std::env::var("RELEASE_IMAGES_INCLUDE_PRERELEASE") {
            self.sync.include_prerelease = val.to_lowercase() == "true" || val == "1";
        }
        if let Ok(val) = std::env::var("RELEASE_IMAGES_SYNC_INTERVAL") {
            if let Ok(secs) = val.parse() {
                self.sync.interval_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("RELEASE_IMAGES_BATCH_WIDTH") {
            if let Ok(width) = val.parse() {
                self.sync.batch_width = width;
            }
        }
        if let Ok(val) = std::env::var("RELEASE_IMAGES_CATALOG") {
            self.catalog.root = PathBuf::from(val);
        }
        if std::env::var("RELEASE_IMAGES_VERBOSE").is_ok() {
            self.verbose = true;
        }

        self
    }

    pub fn validate(&self) -> Result<()> {
        ValidationErrorHandler::validate_url("registry URL", &self.registry.url)?;
        ValidationErrorHandler::validate_url("auth URL", &self.registry.auth_url)?;
        ValidationErrorHandler::validate_timeout(self.registry.timeout_secs)?;

        if self.registry.repository.is_empty() {
            return Err(ResolverError::Validation(
                "Repository name cannot be empty".to_string(),
            ));
        }
        if self.sync.batch_width == 0 {
            return Err(ResolverError::Validation(
                "batch_width must be greater than 0".to_string(),
            ));
        }
        if self.sync.interval_secs == 0 {
            return Err(ResolverError::Validation(
                "sync interval must be greater than 0".to_string(),
            ));
        }
        regex::Regex::new(&self.sync.prerelease_pattern)?;

        if let Some(url) = &self.auxiliary.build_file_url {
            ValidationErrorHandler::validate_url("build file URL", url)?;
        }
        if let Some(url) = &self.auxiliary.properties_url {
            ValidationErrorHandler::validate_url("properties URL", url)?;
        }

        Ok(())
    }
}
