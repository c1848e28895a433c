//! Candidate directory metadata loading
//!
//! A component directory holds one sub-directory per packaged release. Each
//! of those carries a `rancher-compose.yml` whose `.catalog` block declares
//! the release's version label and its compatible version range. A sibling
//! `config.yml` may name the preferred declared version.
//!
//! Missing or unreadable metadata is reported as [`ResolverError::Metadata`]
//! so a single broken component fails its own resolution and nothing else.

use crate::error::{ResolverError, Result};
use crate::resolver::{CandidateDirectory, VersionRange};
use serde::Deserialize;
use serde_yaml_ng::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const COMPONENTS_DIR: &str = "infra-templates";
pub const CANDIDATE_METADATA_FILE: &str = "rancher-compose.yml";
pub const COMPONENT_CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Deserialize)]
struct CandidateMetadata {
    #[serde(rename = ".catalog")]
    catalog: Option<CatalogBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogBlock {
    version: Option<Value>,
    minimum_rancher_version: Option<Value>,
    maximum_rancher_version: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ComponentConfig {
    version: Option<Value>,
}

/// YAML scalars as text; `version: 2` and `version: "2"` read the same
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A component and its candidate directories, read fresh from disk
#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub candidates: Vec<CandidateDirectory>,
    pub preferred: Option<String>,
}

/// Component directories under `<root>/infra-templates`, sorted by name
pub fn list_components(root: &Path) -> Result<Vec<PathBuf>> {
    let components_dir = root.join(COMPONENTS_DIR);
    let mut dirs = sub_directories(&components_dir).map_err(|e| {
        ResolverError::metadata(format!("Error reading {} dir: {}", COMPONENTS_DIR, e), &components_dir)
    })?;
    dirs.sort();
    Ok(dirs)
}

pub fn load_component(dir: &Path) -> Result<Component> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut candidate_dirs = sub_directories(dir)
        .map_err(|e| ResolverError::metadata(format!("Cannot list candidates: {}", e), dir))?;
    candidate_dirs.sort();

    let candidates = candidate_dirs
        .iter()
        .map(|path| load_candidate(path))
        .collect::<Result<Vec<_>>>()?;

    Ok(Component {
        name,
        candidates,
        preferred: load_preferred(dir)?,
    })
}

pub fn load_candidate(dir: &Path) -> Result<CandidateDirectory> {
    let path = dir.join(CANDIDATE_METADATA_FILE);
    let content = fs::read_to_string(&path)
        .map_err(|e| ResolverError::metadata(e.to_string(), &path))?;
    let metadata: CandidateMetadata = serde_yaml_ng::from_str(&content)
        .map_err(|e| ResolverError::metadata(e.to_string(), &path))?;
    let catalog = metadata
        .catalog
        .ok_or_else(|| ResolverError::metadata("missing .catalog block", &path))?;

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let range = VersionRange::from_bounds(
        scalar_text(catalog.minimum_rancher_version.as_ref()).as_deref(),
        scalar_text(catalog.maximum_rancher_version.as_ref()).as_deref(),
    );

    Ok(CandidateDirectory::new(
        name,
        scalar_text(catalog.version.as_ref()).unwrap_or_default(),
        range,
    ))
}

/// Preferred declared version from the component's `config.yml`, if present
pub fn load_preferred(dir: &Path) -> Result<Option<String>> {
    let path = dir.join(COMPONENT_CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| ResolverError::metadata(e.to_string(), &path))?;
    let config: ComponentConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| ResolverError::metadata(e.to_string(), &path))?;

    Ok(scalar_text(config.version.as_ref()).filter(|v| !v.is_empty()))
}

fn sub_directories(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_component_reads_all_candidates() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("ipsec");
        write(
            &dir,
            "1/rancher-compose.yml",
            ".catalog:\n  version: v0.1.0\n  minimum_rancher_version: v1.0.0\n  maximum_rancher_version: v1.9.9\n",
        );
        write(
            &dir,
            "2/rancher-compose.yml",
            ".catalog:\n  version: v0.2.0\n  minimum_rancher_version: v2.0.0\n",
        );
        write(&dir, "config.yml", "name: IPsec\nversion: v0.2.0\n");
        write(&dir, "README.md", "not a candidate");

        let component = load_component(&dir).unwrap();
        assert_eq!(component.name, "ipsec");
        assert_eq!(component.preferred.as_deref(), Some("v0.2.0"));
        assert_eq!(component.candidates.len(), 2);
        assert_eq!(component.candidates[0].name, "1");
        assert_eq!(component.candidates[0].declared_version, "v0.1.0");
        assert_eq!(component.candidates[0].range.to_string(), "[1.0.0, 1.9.9]");
        assert!(component.candidates[1].range.max.is_none());
    }

    #[test]
    fn test_numeric_yaml_scalars_and_malformed_bounds() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "3/rancher-compose.yml",
            ".catalog:\n  version: 2\n  minimum_rancher_version: not-a-version\n",
        );
        let candidate = load_candidate(&tmp.path().join("3")).unwrap();
        assert_eq!(candidate.declared_version, "2");
        assert_eq!(candidate.range, VersionRange::unbounded());
    }

    #[test]
    fn test_missing_metadata_is_recoverable_error() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("healthcheck");
        fs::create_dir_all(dir.join("0")).unwrap();

        let err = load_component(&dir).unwrap_err();
        assert!(err.is_metadata());
    }

    #[test]
    fn test_missing_catalog_block_is_metadata_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "0/rancher-compose.yml", "services: {}\n");
        let err = load_candidate(&tmp.path().join("0")).unwrap_err();
        assert!(err.to_string().contains("missing .catalog block"));
    }

    #[test]
    fn test_preferred_is_optional() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load_preferred(tmp.path()).unwrap(), None);

        write(tmp.path(), "config.yml", "name: only a name\n");
        assert_eq!(load_preferred(tmp.path()).unwrap(), None);

        write(tmp.path(), "config.yml", "version: [unterminated\n");
        assert!(load_preferred(tmp.path()).unwrap_err().is_metadata());
    }

    #[test]
    fn test_list_components_sorted() {
        let tmp = TempDir::new().unwrap();
        for name in ["network-services", "healthcheck", "ipsec"] {
            fs::create_dir_all(tmp.path().join(COMPONENTS_DIR).join(name)).unwrap();
        }
        write(tmp.path(), "infra-templates/README.md", "");

        let names: Vec<String> = list_components(tmp.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["healthcheck", "ipsec", "network-services"]);
    }

    #[test]
    fn test_missing_components_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(list_components(tmp.path()).unwrap_err().is_metadata());
    }
}
