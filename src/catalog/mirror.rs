//! Catalog mirror backed by an already checked-out directory

use crate::common::CatalogMirror;
use crate::error::{ResolverError, Result};
use crate::logging::Logger;
use async_trait::async_trait;
use std::path::PathBuf;

/// Serves one fixed directory for every branch
#[derive(Debug, Clone)]
pub struct LocalMirror {
    root: PathBuf,
    output: Logger,
}

impl LocalMirror {
    pub fn new(root: impl Into<PathBuf>, output: Logger) -> Self {
        Self {
            root: root.into(),
            output,
        }
    }
}

#[async_trait]
impl CatalogMirror for LocalMirror {
    async fn checkout(&self, branch: &str) -> Result<PathBuf> {
        if !self.root.is_dir() {
            return Err(ResolverError::NotFound(format!(
                "Catalog root {} does not exist",
                self.root.display()
            )));
        }

        self.output.verbose(&format!(
            "Using local catalog {} for branch {}",
            self.root.display(),
            branch
        ));
        Ok(self.root.clone())
    }
}
