//! Image extraction from compose files

use crate::common::ImageExtractor;
use crate::error::{ResolverError, Result};
use crate::logging::Logger;
use serde_yaml_ng::{Mapping, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const COMPOSE_FILE: &str = "docker-compose.yml";
pub const COMPOSE_TEMPLATE_FILE: &str = "docker-compose.yml.tpl";

const NO_TEMPLATING_MARKERS: &[&str] = &["# notemplating", "#notemplating"];

/// Compose layouts, told apart by the top-level `version` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeLayout {
    /// Services at the top level
    V1,
    /// Services under a `services:` key
    V2,
}

pub fn detect_layout(document: &Mapping) -> ComposeLayout {
    let major = match document.get("version") {
        Some(Value::String(s)) => s.split('.').next().and_then(|m| m.trim().parse::<u64>().ok()),
        Some(Value::Number(n)) => n.as_f64().map(|f| f as u64),
        _ => None,
    };

    match major {
        Some(m) if m >= 2 => ComposeLayout::V2,
        _ => ComposeLayout::V1,
    }
}

pub fn opts_out_of_templating(content: &str) -> bool {
    let trimmed = content.trim_start();
    NO_TEMPLATING_MARKERS.iter().any(|m| trimmed.starts_with(m))
}

/// Reads `docker-compose.yml` (or an opted-out `.tpl`) from a candidate directory
#[derive(Debug, Clone, Default)]
pub struct ComposeImageExtractor {
    output: Logger,
}

impl ComposeImageExtractor {
    pub fn new(output: Logger) -> Self {
        Self { output }
    }

    fn compose_source(&self, version_dir: &Path) -> Result<Option<String>> {
        let template = version_dir.join(COMPOSE_TEMPLATE_FILE);
        if template.exists() {
            let content = fs::read_to_string(&template)
                .map_err(|e| ResolverError::metadata(e.to_string(), &template))?;
            if opts_out_of_templating(&content) {
                return Ok(Some(content));
            }
            self.output.warning(&format!(
                "Skipping templated compose file {}",
                template.display()
            ));
        }

        let plain = version_dir.join(COMPOSE_FILE);
        if !plain.exists() {
            return Ok(None);
        }
        fs::read_to_string(&plain)
            .map(Some)
            .map_err(|e| ResolverError::metadata(e.to_string(), &plain))
    }

    /// Image references of every service in a compose document, sorted and de-duplicated
    pub fn images_from_str(&self, content: &str) -> Result<Vec<String>> {
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let document: Value = serde_yaml_ng::from_str(content)?;
        let Some(document) = document.as_mapping() else {
            return Ok(Vec::new());
        };

        let services = match detect_layout(document) {
            ComposeLayout::V2 => document.get("services").and_then(Value::as_mapping),
            ComposeLayout::V1 => Some(document),
        };

        let mut images = BTreeSet::new();
        for (name, service) in services.into_iter().flatten() {
            let Some(service) = service.as_mapping() else {
                continue;
            };
            match service.get("image") {
                Some(Value::String(image)) => {
                    images.insert(image.clone());
                }
                Some(Value::Null) => {
                    self.output.warning(&format!(
                        "Null image for service {}",
                        name.as_str().unwrap_or("?")
                    ));
                }
                _ => {}
            }
        }

        Ok(images.into_iter().collect())
    }
}

impl ImageExtractor for ComposeImageExtractor {
    fn images(&self, version_dir: &Path) -> Result<Vec<String>> {
        match self.compose_source(version_dir)? {
            Some(content) => self.images_from_str(&content),
            None => {
                self.output.verbose(&format!(
                    "No compose file in {}",
                    version_dir.display()
                ));
                Ok(Vec::new())
            }
        }
    }
}
