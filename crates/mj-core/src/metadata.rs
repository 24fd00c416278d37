use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{MathJaxError, MathJaxResult};

pub const LIBRARY_DEPENDENCY_NAME: &str = "mathjax-full";
pub const EXPECTED_LIBRARY_VERSION: &str = "3.2.2";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: String,
    #[serde(rename = "resolved", default)]
    pub resolved_location: Option<String>,
    #[serde(rename = "integrity", default)]
    pub integrity_hash: Option<String>,
}

/// Rejects a pinned library version that differs from the one the bridge was built for.
#[derive(Debug, Clone)]
pub struct VersionGate {
    lockfile_path: PathBuf,
    dependency_name: String,
    expected_version: String,
}

impl VersionGate {
    pub fn new(lockfile_path: impl Into<PathBuf>) -> Self {
        Self {
            lockfile_path: lockfile_path.into(),
            dependency_name: LIBRARY_DEPENDENCY_NAME.to_string(),
            expected_version: EXPECTED_LIBRARY_VERSION.to_string(),
        }
    }

    pub fn with_expected_version(mut self, expected_version: impl Into<String>) -> Self {
        self.expected_version = expected_version.into();
        self
    }

    pub fn lockfile_path(&self) -> &Path {
        &self.lockfile_path
    }

    pub fn expected_version(&self) -> &str {
        &self.expected_version
    }

    pub fn check(&self) -> MathJaxResult<Metadata> {
        let metadata = self.read_metadata()?;
        if metadata.version != self.expected_version {
            return Err(MathJaxError::VersionMismatch {
                expected: self.expected_version.clone(),
                found: metadata.version,
            });
        }
        debug!(
            version = %metadata.version,
            lockfile = %self.lockfile_path.display(),
            "library version accepted"
        );
        Ok(metadata)
    }

    /// Reads the pinned entry without comparing versions.
    pub fn read_metadata(&self) -> MathJaxResult<Metadata> {
        let raw = fs::read_to_string(&self.lockfile_path).map_err(|error| {
            MathJaxError::MissingMetadataFile {
                path: self.lockfile_path.clone(),
                message: error.to_string(),
            }
        })?;
        let lockfile: Value =
            serde_json::from_str(&raw).map_err(|error| self.unusable(error.to_string()))?;

        let entry = lockfile
            .get("packages")
            .and_then(|packages| packages.get(format!("node_modules/{}", self.dependency_name)))
            .or_else(|| {
                lockfile
                    .get("dependencies")
                    .and_then(|dependencies| dependencies.get(&self.dependency_name))
            })
            .ok_or_else(|| self.unusable("no entry in packages or dependencies".to_string()))?;

        serde_json::from_value(entry.clone()).map_err(|error| self.unusable(error.to_string()))
    }

    fn unusable(&self, message: String) -> MathJaxError {
        MathJaxError::MissingDependencyRecord {
            name: self.dependency_name.clone(),
            message,
        }
    }
}
