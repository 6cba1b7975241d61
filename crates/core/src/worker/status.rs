//! Coverage report of the content store against the manifest.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{ServiceWorker, WorkerState};
use crate::Error;
use crate::cache::{CacheStorage, CacheStore};
use crate::manifest::stored_resource_key;
use crate::network::Network;

/// Snapshot of a worker and its stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheStatus {
    pub state: WorkerState,
    pub skip_waiting: bool,
    /// Entries resident in the content store.
    pub content_entries: usize,
    /// Manifest keys with no content entry.
    pub missing: Vec<String>,
    /// A manifest record exists and parses.
    pub manifest_persisted: bool,
    /// The persisted record equals this worker's manifest.
    pub manifest_current: bool,
}

impl<S: CacheStorage, N: Network> ServiceWorker<S, N> {
    /// Report without creating stores that do not exist yet.
    pub async fn status(&self) -> Result<CacheStatus, Error> {
        let present: HashSet<String> = if self.storage.has(&self.stores.content).await? {
            let content = self.storage.open(&self.stores.content).await?;
            content
                .keys()
                .await?
                .iter()
                .map(|request| stored_resource_key(&self.origin, &request.url))
                .collect()
        } else {
            HashSet::new()
        };

        let missing = self
            .manifest
            .keys()
            .filter(|key| !present.contains(*key))
            .map(str::to_string)
            .collect();

        let persisted = match self.persisted_manifest().await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, "persisted manifest unreadable");
                None
            }
        };

        Ok(CacheStatus {
            state: self.state().await,
            skip_waiting: self.skip_waiting_requested(),
            content_entries: present.len(),
            missing,
            manifest_persisted: persisted.is_some(),
            manifest_current: persisted.as_ref() == Some(&self.manifest),
        })
    }
}
