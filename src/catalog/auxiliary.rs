//! Images injected by the orchestration engine binary
//!
//! These never appear in the catalog. The release's build file pins an
//! engine version (`ENV CATTLE_CATTLE_VERSION <v>`), and that engine
//! version's global properties list the load-balancer and bootstrap images.

use crate::config::AuxiliaryConfig;
use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler, ValidationErrorHandler};
use crate::error::{ResolverError, Result};
use crate::logging::Logger;
use reqwest::Client;
use std::time::Duration;

pub const ENGINE_VERSION_VAR: &str = "CATTLE_CATTLE_VERSION";
pub const VERSION_PLACEHOLDER: &str = "{version}";

const IMAGE_PROPERTY_PREFIXES: &[&str] = &["lb.instance.image=", "bootstrap.required.image="];

/// Substitute `{version}` in a URL template
pub fn expand_template(template: &str, version: &str) -> String {
    template.replace(VERSION_PLACEHOLDER, version)
}

/// Value of the first `ENV CATTLE_CATTLE_VERSION <value>` line
pub fn detect_engine_version(build_file: &str) -> Option<String> {
    build_file.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some("ENV"), Some(var), Some(value)) if var == ENGINE_VERSION_VAR => {
                Some(value.to_string())
            }
            _ => None,
        }
    })
}

/// Values of the image-bearing property lines, in document order
pub fn injected_images(properties: &str) -> Vec<String> {
    properties
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            IMAGE_PROPERTY_PREFIXES
                .iter()
                .find_map(|prefix| line.strip_prefix(prefix))
        })
        .map(str::trim)
        .filter(|image| !image.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct AuxiliaryImages {
    client: Client,
    build_file_url: String,
    properties_url: String,
    output: Logger,
}

impl AuxiliaryImages {
    pub fn new(
        client: Client,
        build_file_url: impl Into<String>,
        properties_url: impl Into<String>,
        output: Logger,
    ) -> Self {
        Self {
            client,
            build_file_url: build_file_url.into(),
            properties_url: properties_url.into(),
            output,
        }
    }

    /// `None` unless both URL templates are configured
    pub fn from_config(config: &AuxiliaryConfig, timeout: Duration, output: Logger) -> Result<Option<Self>> {
        let (Some(build_file_url), Some(properties_url)) =
            (&config.build_file_url, &config.properties_url)
        else {
            return Ok(None);
        };

        ValidationErrorHandler::validate_url("build file URL", build_file_url)?;
        ValidationErrorHandler::validate_url("properties URL", properties_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolverError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Some(Self::new(client, build_file_url, properties_url, output)))
    }

    async fn fetch(&self, url: &str, what: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, what))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpErrorHandler::handle_registry_error(status, "", what));
        }

        response
            .text()
            .await
            .map_err(|e| ResolverError::Network(format!("Failed to read {}: {}", what, e)))
    }

    /// Injected images for a release tag; failures are logged and yield nothing
    pub async fn images_for(&self, tag: &str) -> Vec<String> {
        let build_file = match self
            .fetch(&expand_template(&self.build_file_url, tag), "build file fetch")
            .await
        {
            Ok(content) => content,
            Err(e) => {
                self.output.warning(&format!("Couldn't fetch build file for {}: {}", tag, e));
                return Vec::new();
            }
        };

        let Some(engine_version) = detect_engine_version(&build_file) else {
            self.output
                .warning(&format!("Couldn't find {} in build file for {}", ENGINE_VERSION_VAR, tag));
            return Vec::new();
        };
        self.output.verbose(&format!(
            "Detected engine version {} for release {}",
            engine_version, tag
        ));

        match self
            .fetch(
                &expand_template(&self.properties_url, &engine_version),
                "properties fetch",
            )
            .await
        {
            Ok(properties) => injected_images(&properties),
            Err(e) => {
                self.output.warning(&format!(
                    "Couldn't fetch properties for engine {}: {}",
                    engine_version, e
                ));
                Vec::new()
            }
        }
    }
}
