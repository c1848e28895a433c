//! Docker Registry HTTP API v2 client for the tracked repository
//!
//! Implements the two read operations the sync engine needs:
//! - Tag listing (GET /v2/{name}/tags/list, following `Link` pagination)
//! - Digest lookup (HEAD /v2/{name}/manifests/{reference})
//!
//! Every request carries a bearer token obtained through the [`TokenManager`].

use crate::common::{RegistryApi, TokenSource};
use crate::config::RegistryConfig;
use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::error::{ResolverError, Result};
use crate::logging::Logger;
use crate::registry::auth::Auth;
use crate::registry::token_manager::TokenManager;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, LINK};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use std::sync::Arc;

pub const CONTENT_DIGEST_HEADER: &str = "Docker-Content-Digest";

const MANIFEST_ACCEPT: &str =
    "application/json, application/vnd.docker.distribution.manifest.v2+json";

/// One page of `GET /v2/<name>/tags/list`; only `tags` is read
#[derive(Debug, Deserialize)]
struct TagList {
    tags: Option<Vec<String>>,
}

pub struct RegistryClientBuilder {
    config: RegistryConfig,
    output: Logger,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl RegistryClientBuilder {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            output: Logger::default(),
            token_source: None,
        }
    }

    pub fn with_output(mut self, output: Logger) -> Self {
        self.output = output;
        self
    }

    /// Replace the HTTP token endpoint with another issuer
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        let client = Client::builder()
            .timeout(self.config.timeout())
            .build()
            .map_err(|e| ResolverError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let source = match self.token_source {
            Some(source) => source,
            None => Arc::new(Auth::new(
                client.clone(),
                &self.config.auth_url,
                &self.config.service,
                &self.config.scope(),
                self.output.clone(),
            )),
        };
        let token_manager =
            TokenManager::new(source, self.config.token_margin(), self.output.clone());

        Ok(RegistryClient {
            client,
            address: self.config.url.trim_end_matches('/').to_string(),
            repository: self.config.repository,
            token_manager,
            output: self.output,
        })
    }
}

pub struct RegistryClient {
    client: Client,
    address: String,
    repository: String,
    token_manager: TokenManager,
    output: Logger,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig, output: Logger) -> Result<Self> {
        Self::builder(config).with_output(output).build()
    }

    pub fn builder(config: RegistryConfig) -> RegistryClientBuilder {
        RegistryClientBuilder::new(config)
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Build a request with a valid bearer token; token failures go to the caller
    async fn authorized_request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.token_manager.bearer().await?;
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header(ACCEPT, MANIFEST_ACCEPT))
    }

    fn absolute(&self, location: &str) -> String {
        if location.starts_with('/') {
            format!("{}{}", self.address, location)
        } else {
            location.to_string()
        }
    }
}

/// Extract the `rel="next"` target from a `Link` header
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.contains("rel=\"next\"") && !params.contains("rel=next") {
            return None;
        }
        let target = target.trim();
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(|t| t.to_string())
    })
}

#[async_trait]
impl RegistryApi for RegistryClient {
    async fn list_tags(&self) -> Result<Vec<String>> {
        self.output
            .verbose(&format!("Listing tags for repository: {}", self.repository));

        let mut tags = Vec::new();
        let mut url = Some(format!("{}/v2/{}/tags/list", self.address, self.repository));

        while let Some(current) = url.take() {
            let response = self
                .authorized_request(Method::GET, &current)
                .await?
                .send()
                .await
                .map_err(|e| NetworkErrorHandler::handle_network_error(&e, "tag listing"))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to read error response".to_string());
                return Err(HttpErrorHandler::handle_registry_error(
                    status,
                    &error_text,
                    "tag listing",
                ));
            }

            url = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(next_link)
                .map(|next| self.absolute(&next));

            let page: TagList = response.json().await.map_err(|e| {
                ResolverError::Parse(format!("Failed to parse tags response: {}", e))
            })?;
            tags.extend(page.tags.unwrap_or_default());
        }

        self.output.verbose(&format!(
            "Fetched {} tags for repository {}",
            tags.len(),
            self.repository
        ));

        Ok(tags)
    }

    async fn manifest_digest(&self, tag: &str) -> Result<String> {
        let url = format!("{}/v2/{}/manifests/{}", self.address, self.repository, tag);

        let response = self
            .authorized_request(Method::HEAD, &url)
            .await?
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, "manifest lookup"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpErrorHandler::handle_registry_error(
                status,
                "",
                &format!("manifest lookup for {}", tag),
            ));
        }

        response
            .headers()
            .get(CONTENT_DIGEST_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|digest| !digest.is_empty())
            .map(|digest| digest.to_string())
            .ok_or_else(|| {
                ResolverError::Registry(format!(
                    "Manifest response for {} has no {} header",
                    tag, CONTENT_DIGEST_HEADER
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_link_parsing() {
        let header = r#"</v2/rancher/server/tags/list?last=v1.6.10&n=100>; rel="next""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("/v2/rancher/server/tags/list?last=v1.6.10&n=100")
        );
        assert_eq!(next_link(r#"</v2/x/tags/list?last=a>; rel="prev""#), None);
        assert_eq!(next_link(""), None);
    }

    #[test]
    fn test_tag_page_parsing() {
        let page: TagList =
            serde_json::from_str(r#"{"name": "rancher/server", "tags": ["v1.6.10", "stable"]}"#).unwrap();
        assert_eq!(page.tags.unwrap(), vec!["v1.6.10", "stable"]);

        let empty: TagList = serde_json::from_str(r#"{"name": "rancher/server", "tags": null}"#).unwrap();
        assert!(empty.tags.is_none());
    }

    #[test]
    fn test_builder_trims_address() {
        let mut config = RegistryConfig::default();
        config.url = "https://registry.example.com/".to_string();
        let client = RegistryClient::new(config, Logger::new_quiet()).unwrap();
        assert_eq!(client.address, "https://registry.example.com");
        assert_eq!(client.absolute("/v2/a/tags/list"), "https://registry.example.com/v2/a/tags/list");
        assert_eq!(client.repository(), "rancher/server");
    }
}
