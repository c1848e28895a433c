//! Error types and handlers for registry, sync and resolution operations

pub mod handlers;

use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ResolverError>;

#[derive(Debug, Clone)]
pub enum ResolverError {
    /// Network related errors
    Network(String),
    /// Registry related errors
    Registry(String),
    /// Authentication errors
    Auth(String),
    /// File IO errors
    Io(String),
    /// Parse errors
    Parse(String),
    /// Request timed out
    Timeout(String),
    /// Validation errors
    Validation(String),
    /// Configuration errors
    Config(String),
    /// A release tag that is not a semantic version
    InvalidVersion { tag: String, message: String },
    /// Candidate directory metadata that is missing or unreadable
    Metadata {
        message: String,
        path: Option<PathBuf>,
    },
    /// Resource not found
    NotFound(String),
}

impl ResolverError {
    pub fn metadata(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        ResolverError::Metadata {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Whether the error came from reading catalog metadata rather than from the network
    pub fn is_metadata(&self) -> bool {
        matches!(self, ResolverError::Metadata { .. })
    }
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverError::Network(msg) => write!(f, "Network error: {}", msg),
            ResolverError::Registry(msg) => write!(f, "Registry error: {}", msg),
            ResolverError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            ResolverError::Io(msg) => write!(f, "IO error: {}", msg),
            ResolverError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ResolverError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ResolverError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ResolverError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ResolverError::InvalidVersion { tag, message } => {
                write!(f, "Invalid version ({}): {}", tag, message)
            }
            ResolverError::Metadata { message, path } => {
                if let Some(path) = path {
                    write!(f, "Metadata error at {}: {}", path.display(), message)
                } else {
                    write!(f, "Metadata error: {}", message)
                }
            }
            ResolverError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for ResolverError {}

impl From<std::io::Error> for ResolverError {
    fn from(err: std::io::Error) -> Self {
        ResolverError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ResolverError {
    fn from(err: serde_json::Error) -> Self {
        ResolverError::Parse(err.to_string())
    }
}

impl From<serde_yaml_ng::Error> for ResolverError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        ResolverError::Parse(format!("YAML error: {}", err))
    }
}

impl From<semver::Error> for ResolverError {
    fn from(err: semver::Error) -> Self {
        ResolverError::Parse(format!("Semantic version error: {}", err))
    }
}

impl From<reqwest::Error> for ResolverError {
    fn from(err: reqwest::Error) -> Self {
        ResolverError::Network(err.to_string())
    }
}

impl From<url::ParseError> for ResolverError {
    fn from(err: url::ParseError) -> Self {
        ResolverError::Validation(err.to_string())
    }
}

impl From<regex::Error> for ResolverError {
    fn from(err: regex::Error) -> Self {
        ResolverError::Config(format!("Invalid pattern: {}", err))
    }
}

impl From<crate::concurrency::ConcurrencyError> for ResolverError {
    fn from(err: crate::concurrency::ConcurrencyError) -> Self {
        ResolverError::Config(format!("Concurrency error: {}", err))
    }
}
