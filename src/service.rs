//! Release image lookup
//!
//! Ties the sync engine's alias index to catalog resolution: a tag (possibly
//! a moving alias such as `stable`) becomes a release version, the release
//! picks a catalog branch, and every component contributes the images of the
//! directory selected for that version.

use crate::catalog::metadata::COMPONENTS_DIR;
use crate::catalog::{AuxiliaryImages, BranchSelector, list_components, load_component};
use crate::common::{CatalogMirror, ImageExtractor};
use crate::error::Result;
use crate::logging::Logger;
use crate::resolver::{
    CandidateDirectory, DirectorySelection, parse_release_version, resolve_version_directory,
};
use crate::sync::SyncEngine;
use semver::Version;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Images needed by one release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageSet {
    pub images: Vec<String>,
    /// Components skipped because their metadata could not be read
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
}

/// Directory chosen for one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentSelection {
    pub component: String,
    #[serde(flatten)]
    pub selection: DirectorySelection,
}

/// Per-component selections for one release
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseResolution {
    pub branch: String,
    #[serde(skip)]
    pub root: PathBuf,
    pub components: Vec<ComponentSelection>,
    pub unresolved: Vec<String>,
}

pub struct ImageService {
    engine: Arc<SyncEngine>,
    mirror: Arc<dyn CatalogMirror>,
    extractor: Arc<dyn ImageExtractor>,
    branches: BranchSelector,
    auxiliary: Option<AuxiliaryImages>,
    output: Logger,
}

impl ImageService {
    pub fn new(
        engine: Arc<SyncEngine>,
        mirror: Arc<dyn CatalogMirror>,
        extractor: Arc<dyn ImageExtractor>,
        branches: BranchSelector,
        output: Logger,
    ) -> Self {
        Self {
            engine,
            mirror,
            extractor,
            branches,
            auxiliary: None,
            output,
        }
    }

    pub fn with_auxiliary(mut self, auxiliary: Option<AuxiliaryImages>) -> Self {
        self.auxiliary = auxiliary;
        self
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn sync_snapshot(&self) -> BTreeMap<String, String> {
        self.engine.snapshot()
    }

    pub fn find_tag_analog(&self, tag: &str) -> String {
        self.engine.find_tag_analog(tag)
    }

    pub fn resolve_version_directory(
        &self,
        version: &Version,
        candidates: &[CandidateDirectory],
        preferred: Option<&str>,
    ) -> DirectorySelection {
        resolve_version_directory(version, candidates, preferred)
    }

    /// Release tag and version behind `tag`.
    ///
    /// The alias is tried first so moving tags map onto their release. If it
    /// does not parse, the other tags on the same digest are tried in lexical
    /// order, then `tag` itself. The alias's parse error is reported when
    /// none of them is a release version.
    pub fn release_version(&self, tag: &str) -> Result<(String, Version)> {
        let analog = self.find_tag_analog(tag);
        let err = match parse_release_version(&analog) {
            Ok(version) => return Ok((analog, version)),
            Err(e) => e,
        };

        let index = self.engine.index();
        let siblings = index
            .digest(tag)
            .and_then(|digest| index.tags_for(digest))
            .into_iter()
            .flatten()
            .filter(|sibling| sibling.as_str() != tag && **sibling != analog);
        for sibling in siblings {
            if let Ok(version) = parse_release_version(sibling) {
                self.output.verbose(&format!("{} resolved to release tag {}", tag, sibling));
                return Ok((sibling.clone(), version));
            }
        }

        parse_release_version(tag)
            .map(|version| (tag.to_string(), version))
            .map_err(|_| err)
    }

    /// Load one component from disk and select its directory for `version`
    pub fn resolve_component(&self, component_dir: &Path, version: &Version) -> Result<ComponentSelection> {
        let component = load_component(component_dir)?;
        let selection = resolve_version_directory(
            version,
            &component.candidates,
            component.preferred.as_deref(),
        );
        Ok(ComponentSelection {
            component: component.name,
            selection,
        })
    }

    /// Directory selection for every component of the release's catalog branch
    pub async fn resolve_release(&self, version: &Version) -> Result<ReleaseResolution> {
        let branch = self.branches.branch_for(version).to_string();
        let root = self.mirror.checkout(&branch).await?;

        let mut resolution = ReleaseResolution {
            branch,
            root: root.clone(),
            components: Vec::new(),
            unresolved: Vec::new(),
        };
        for component_dir in list_components(&root)? {
            match self.resolve_component(&component_dir, version) {
                Ok(selection) => resolution.components.push(selection),
                Err(e) if e.is_metadata() => {
                    self.output.warning(&format!("Skipping component: {}", e));
                    resolution.unresolved.push(dir_name(&component_dir));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(resolution)
    }

    pub async fn images_for_tag(&self, tag: &str) -> Result<ImageSet> {
        let (version_tag, version) = self.release_version(tag)?;

        let mut resolution = self.resolve_release(&version).await?;
        self.output.verbose(&format!(
            "Tag {} resolves to release {} on branch {}",
            tag, version, resolution.branch
        ));

        let mut images = BTreeSet::new();
        for selected in &resolution.components {
            if !selected.selection.is_available() {
                self.output.verbose(&format!(
                    "No directory of {} admits {}",
                    selected.component, version
                ));
                continue;
            }
            let version_dir = resolution
                .root
                .join(COMPONENTS_DIR)
                .join(&selected.component)
                .join(&selected.selection.name);
            match self.extractor.images(&version_dir) {
                Ok(found) => images.extend(found),
                Err(e) => {
                    self.output.warning(&format!(
                        "Cannot read images of {}: {}",
                        selected.component, e
                    ));
                    resolution.unresolved.push(selected.component.clone());
                }
            }
        }

        if let Some(auxiliary) = &self.auxiliary {
            images.extend(auxiliary.images_for(&version_tag).await);
        }

        Ok(ImageSet {
            images: images.into_iter().collect(),
            unresolved: resolution.unresolved,
        })
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
