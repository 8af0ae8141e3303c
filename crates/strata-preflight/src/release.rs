//! Release manifest reading
//!
//! A release bundle manifest lists, per supported Kubernetes version, the
//! artifacts to install. The engine only needs the version list.

use std::path::PathBuf;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use strata_common::{Error, Result};

/// Source of release metadata
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReleaseReader: Send + Sync {
    /// Kubernetes versions the release can install
    async fn supported_kube_versions(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundlesManifest {
    spec: BundlesSpec,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundlesSpec {
    #[serde(default)]
    versions_bundles: Vec<VersionsBundle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionsBundle {
    kube_version: String,
}

/// Parse the supported versions out of a bundle manifest
pub fn parse_bundles_manifest(content: &str) -> Result<Vec<String>> {
    let manifest: BundlesManifest = serde_yaml::from_str(content)
        .map_err(|e| Error::serialization_for_kind("Bundles", e.to_string()))?;
    Ok(manifest
        .spec
        .versions_bundles
        .into_iter()
        .map(|b| b.kube_version)
        .collect())
}

/// [`ReleaseReader`] over a bundle manifest file on disk
#[derive(Clone, Debug)]
pub struct FileReleaseReader {
    path: PathBuf,
}

impl FileReleaseReader {
    /// Create a reader for the manifest at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReleaseReader for FileReleaseReader {
    async fn supported_kube_versions(&self) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::internal_with_context(
                "release_manifest",
                format!("failed to read {}: {e}", self.path.display()),
            )
        })?;
        parse_bundles_manifest(&content)
    }
}
