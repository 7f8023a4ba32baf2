//! Project context: the read-only view of the target project a run is
//! resolved against.
//!
//! Capabilities are the script names declared in the project's
//! `package.json`. A missing or unparsable manifest is a setup error.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::error::{GatekeeperError, Result};

/// Manifest file the capability declaration is read from.
pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    scripts: BTreeMap<String, serde_json::Value>,
}

/// Read-only context for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    root: PathBuf,
    manifest_path: Option<PathBuf>,
    capabilities: BTreeMap<String, String>,
}

impl ProjectContext {
    /// Load the context for the project at `root`.
    pub fn load(root: &Path) -> Result<Self> {
        if !root.exists() {
            return Err(GatekeeperError::ProjectNotFound(root.to_path_buf()));
        }
        let root = root.canonicalize()?;

        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(GatekeeperError::ManifestNotFound(manifest_path));
        }

        let raw = std::fs::read_to_string(&manifest_path).map_err(|source| {
            GatekeeperError::ManifestUnreadable {
                path: manifest_path.clone(),
                source,
            }
        })?;
        let manifest: Manifest =
            serde_json::from_str(&raw).map_err(|source| GatekeeperError::ManifestInvalid {
                path: manifest_path.clone(),
                source,
            })?;

        let capabilities = manifest
            .scripts
            .into_iter()
            .map(|(name, value)| {
                let command = value.as_str().map(str::to_string).unwrap_or_default();
                (name, command)
            })
            .collect::<BTreeMap<_, _>>();

        debug!(
            root = %root.display(),
            capabilities = capabilities.len(),
            "Loaded project context"
        );

        Ok(Self {
            root,
            manifest_path: Some(manifest_path),
            capabilities,
        })
    }

    /// Build a context from an explicit capability list, without a manifest.
    pub fn with_capabilities<I, S>(root: impl Into<PathBuf>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: root.into(),
            manifest_path: None,
            capabilities: capabilities
                .into_iter()
                .map(|c| (c.into(), String::new()))
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> Option<&Path> {
        self.manifest_path.as_deref()
    }

    /// Whether the project declares the named action.
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Declared action names in sorted order.
    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.capabilities.keys().map(String::as_str)
    }

    /// Whether `path` (relative to the root) exists.
    pub fn has_file(&self, path: &Path) -> bool {
        self.root.join(path).exists()
    }
}
