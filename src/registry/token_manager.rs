//! Token management with serialized refresh
//!
//! The current token is kept behind one async mutex. The mutex is held
//! across the issuance call, so concurrent callers that find the token
//! stale wait for a single refresh instead of each issuing their own.
//! Tokens are replaced, never mutated in place.

use crate::common::TokenSource;
use crate::error::{ResolverError, Result};
use crate::logging::Logger;
use crate::registry::auth::Token;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Thread-safe token manager that handles lazy acquisition and refresh
#[derive(Clone)]
pub struct TokenManager {
    source: Arc<dyn TokenSource>,
    current: Arc<Mutex<Option<Arc<Token>>>>,
    margin: Duration,
    output: Logger,
}

impl TokenManager {
    pub fn new(source: Arc<dyn TokenSource>, margin: Duration, output: Logger) -> Self {
        Self {
            source,
            current: Arc::new(Mutex::new(None)),
            margin,
            output,
        }
    }

    /// Return a token outside the safety margin, acquiring or refreshing as needed.
    ///
    /// Issuance failures are returned to the caller as-is and the previous
    /// token (if any) stays in place. A token that arrives already inside the
    /// margin is rejected as an `Auth` error and not cached.
    pub async fn ensure_valid(&self) -> Result<Arc<Token>> {
        let mut guard = self.current.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.is_valid_at(Utc::now(), self.margin) {
                return Ok(Arc::clone(token));
            }
            self.output.verbose("Refreshing expired authentication token...");
        }

        let fresh = Arc::new(self.source.issue_token().await?);
        if !fresh.is_valid_at(Utc::now(), self.margin) {
            return Err(ResolverError::Auth(format!(
                "Issued token expires within the {}s safety margin (lifetime {}s)",
                self.margin.as_secs(),
                fresh.expires_in.as_secs()
            )));
        }
        *guard = Some(Arc::clone(&fresh));

        Ok(fresh)
    }

    /// Bearer value for an `Authorization` header
    pub async fn bearer(&self) -> Result<String> {
        Ok(self.ensure_valid().await?.access_token.clone())
    }
}
