//! Bearer token issuance for registry access

use crate::common::TokenSource;
use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::error::{ResolverError, Result};
use crate::logging::Logger;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN: u64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
    expires_in: Option<u64>,
    issued_at: Option<DateTime<Utc>>,
}

/// An access credential with its issue time and validity
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub access_token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_in: Duration,
}

impl Token {
    pub fn new(access_token: impl Into<String>, issued_at: DateTime<Utc>, expires_in: Duration) -> Self {
        Self {
            access_token: access_token.into(),
            issued_at,
            expires_in,
        }
    }

    /// Instant after which the token is treated as expired
    pub fn stale_after(&self, margin: Duration) -> DateTime<Utc> {
        let lifetime = self.expires_in.as_secs() as i64 - margin.as_secs() as i64;
        self.issued_at + chrono::Duration::seconds(lifetime)
    }

    /// A token is invalid once `now >= issued_at + expires_in - margin`
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now < self.stale_after(margin)
    }
}

/// HTTP token issuance against a registry auth service
#[derive(Debug, Clone)]
pub struct Auth {
    client: Client,
    auth_url: String,
    service: String,
    scope: String,
    output: Logger,
}

impl Auth {
    pub fn new(client: Client, auth_url: &str, service: &str, scope: &str, output: Logger) -> Self {
        Self {
            client,
            auth_url: auth_url.to_string(),
            service: service.to_string(),
            scope: scope.to_string(),
            output,
        }
    }

    fn into_token(response: TokenResponse) -> Result<Token> {
        let access_token = response
            .access_token
            .or(response.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ResolverError::Auth("Token response carried no token".to_string()))?;

        Ok(Token {
            access_token,
            issued_at: response.issued_at.unwrap_or_else(Utc::now),
            expires_in: Duration::from_secs(response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN)),
        })
    }
}

#[async_trait]
impl TokenSource for Auth {
    async fn issue_token(&self) -> Result<Token> {
        self.output.detail(&format!(
            "Requesting token from: {} (service={}, scope={})",
            self.auth_url, self.service, self.scope
        ));

        let response = self
            .client
            .get(&self.auth_url)
            .query(&[("service", self.service.as_str()), ("scope", self.scope.as_str())])
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, "token request"))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            self.output.error(&format!(
                "Token request failed with status {}: {}",
                status, error_text
            ));
            return Err(HttpErrorHandler::handle_auth_error(status, &error_text));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| ResolverError::Parse(format!("Failed to parse token response: {}", e)))?;
        let token = Self::into_token(token_response)?;

        self.output.verbose(&format!(
            "Created auth token (issued_at: {}, expires_in: {}s)",
            token.issued_at,
            token.expires_in.as_secs()
        ));

        Ok(token)
    }
}
