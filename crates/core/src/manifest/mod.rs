//! Resource manifest and build-time bundle.
//!
//! The manifest maps every cacheable resource key to its content
//! fingerprint. It is fixed for the lifetime of a worker; a new deployment
//! ships a new manifest and therefore a new worker.

pub mod keys;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

pub use keys::{ROOT_KEY, request_resource_key, resource_url, stored_resource_key};

/// Immutable mapping of resource key to content fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest {
    resources: BTreeMap<String, String>,
}

impl ResourceManifest {
    pub fn new(resources: BTreeMap<String, String>) -> Self {
        Self { resources }
    }

    /// Parse the flat JSON object form used by the persisted record.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::ManifestCorrupt(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::InvalidInput(format!("failed to serialize manifest: {e}")))
    }

    /// Fingerprint recorded for `key`, if listed.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.resources.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// A key survives an upgrade only if it is still listed here and
    /// `previous` recorded the same fingerprint for it.
    pub fn retains(&self, previous: &ResourceManifest, key: &str) -> bool {
        match (self.get(key), previous.get(key)) {
            (Some(current), Some(old)) => current == old,
            _ => false,
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResourceManifest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { resources: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Everything baked into a worker at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// Resource key to fingerprint.
    pub resources: ResourceManifest,

    /// Resource keys fetched fresh on every install.
    #[serde(default)]
    pub shell: Vec<String>,
}

impl Bundle {
    /// Load a bundle from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the file cannot be read, is not
    /// valid JSON, or lists an empty shell key.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidInput(format!("failed to read bundle {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        let bundle: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidInput(format!("invalid bundle: {e}")))?;
        bundle.validate()?;
        Ok(bundle)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.shell.iter().any(|key| key.trim().is_empty()) {
            return Err(Error::InvalidInput("shell entries must not be empty".into()));
        }
        for key in &self.shell {
            if !self.resources.contains(key) {
                tracing::warn!(key = %key, "shell resource is not listed in the manifest");
            }
        }
        Ok(())
    }
}
