//! Standardized error handling for registry HTTP responses

use crate::error::{ResolverError, Result};
use reqwest::StatusCode;

/// Standard error handler for HTTP responses
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Handle token issuance HTTP errors
    pub fn handle_auth_error(status: StatusCode, error_text: &str) -> ResolverError {
        let error_msg = match status.as_u16() {
            400 => "Invalid token request parameters".to_string(),
            401 => "Invalid credentials provided".to_string(),
            403 => "Access denied - insufficient permissions".to_string(),
            404 => "Authentication endpoint not found".to_string(),
            _ => format!("Authentication failed (status {}): {}", status, error_text),
        };

        ResolverError::Auth(error_msg)
    }

    /// Handle registry-related HTTP errors
    pub fn handle_registry_error(
        status: StatusCode,
        error_text: &str,
        operation: &str,
    ) -> ResolverError {
        let error_msg = match status.as_u16() {
            401 => format!(
                "Unauthorized to perform {} operation: {}",
                operation, error_text
            ),
            403 => format!(
                "Forbidden: insufficient permissions for {}: {}",
                operation, error_text
            ),
            404 => format!("Resource not found for {}: {}", operation, error_text),
            429 => format!("Rate limited during {}: {}", operation, error_text),
            500 => format!("Registry server error during {}: {}", operation, error_text),
            502 | 503 => format!("Registry unavailable for {}: {}", operation, error_text),
            _ => format!("{} failed (status {}): {}", operation, status, error_text),
        };

        match status.as_u16() {
            404 => ResolverError::NotFound(error_msg),
            _ => ResolverError::Registry(error_msg),
        }
    }
}

/// Network error categorization and handling
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Categorize and format network errors with helpful context
    pub fn handle_network_error(error: &reqwest::Error, context: &str) -> ResolverError {
        if error.is_timeout() {
            ResolverError::Timeout(format!("{} timeout: {}", context, error))
        } else if error.is_connect() {
            ResolverError::Network(format!("Connection error during {}: {}", context, error))
        } else if error.to_string().contains("dns") {
            ResolverError::Network(format!("DNS resolution error for {}: {}", context, error))
        } else if error.to_string().contains("certificate") {
            ResolverError::Network(format!(
                "TLS certificate error during {}: {}",
                context, error
            ))
        } else {
            ResolverError::Network(format!("{} network error: {}", context, error))
        }
    }
}

/// Validation error utilities
pub struct ValidationErrorHandler;

impl ValidationErrorHandler {
    /// Standard URL validation
    pub fn validate_url(name: &str, url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(ResolverError::Validation(format!("{} cannot be empty", name)));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ResolverError::Validation(format!(
                "Invalid {}: {}. Must start with http:// or https://",
                name, url
            )));
        }

        url::Url::parse(url)?;
        Ok(())
    }

    /// Standard numeric range validation
    pub fn validate_timeout(timeout: u64) -> Result<()> {
        if timeout == 0 {
            return Err(ResolverError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if timeout > 86400 {
            // 24 hours
            return Err(ResolverError::Validation(
                "Timeout cannot exceed 24 hours (86400 seconds)".to_string(),
            ));
        }

        Ok(())
    }
}
