//! Activation stage: reconcile the content store with the new manifest.
//!
//! The previous activation left its manifest in the manifest store. Content
//! entries whose key is still listed with the same fingerprint in both
//! manifests are kept and never re-fetched; every other entry is evicted.
//! The freshly staged shell then overwrites the content store, the temp
//! store is dropped and the new manifest is persisted, in that order.
//!
//! Any failure wipes all three stores. A half-reconciled cache is never
//! left behind; the next page load repopulates from the network.

use serde::{Deserialize, Serialize};

use super::{LifecycleSignal, ServiceWorker, WorkerState};
use crate::Error;
use crate::cache::{CacheStorage, CacheStore, copy_all};
use crate::http::Response;
use crate::manifest::{ResourceManifest, stored_resource_key};
use crate::network::Network;

/// Which branch of reconciliation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPath {
    /// No persisted manifest: the content store was rebuilt from the shell.
    FirstInstall,
    /// A previous manifest was found and diffed against.
    Upgrade,
}

/// Outcome of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivationReport {
    pub path: ActivationPath,
    /// Content entries kept from the previous deployment.
    pub retained: usize,
    /// Resource keys evicted from the content store.
    pub evicted: Vec<String>,
    /// Shell entries copied in from the temp store.
    pub promoted: usize,
}

impl<S: CacheStorage, N: Network> ServiceWorker<S, N> {
    /// Run activation. At most one activation runs at a time.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` unless the worker is `Installed`
    /// - `Error::ActivationFailed` after any reconciliation failure; all
    ///   three stores have been deleted by then
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let _guard = self.activation.lock().await;

        {
            let mut state = self.state.write().await;
            if *state != WorkerState::Installed {
                return Err(Error::InvalidState(format!("cannot activate from {:?}", *state)));
            }
            *state = WorkerState::Activating;
        }

        match self.reconcile().await {
            Ok(report) => {
                self.set_state(WorkerState::Activated).await;
                self.emit(LifecycleSignal::ClaimClients);
                tracing::info!(
                    path = ?report.path,
                    retained = report.retained,
                    evicted = report.evicted.len(),
                    promoted = report.promoted,
                    "activation complete"
                );
                Ok(report)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to upgrade worker, wiping caches");
                self.wipe().await;
                self.set_state(WorkerState::Redundant).await;
                Err(Error::ActivationFailed(err.to_string()))
            }
        }
    }

    async fn reconcile(&self) -> Result<ActivationReport, Error> {
        let mut content = self.storage.open(&self.stores.content).await?;
        let temp = self.storage.open(&self.stores.temp).await?;
        let manifests = self.storage.open(&self.stores.manifest).await?;

        let record = manifests.match_request(&self.manifest_record_request()).await?;

        let Some(record) = record else {
            tracing::info!("no persisted manifest, rebuilding content store");
            self.storage.delete(&self.stores.content).await?;
            content = self.storage.open(&self.stores.content).await?;
            let promoted = copy_all(&temp, &content).await?;
            self.storage.delete(&self.stores.temp).await?;
            self.persist_manifest(&manifests).await?;
            return Ok(ActivationReport { path: ActivationPath::FirstInstall, retained: 0, evicted: Vec::new(), promoted });
        };

        let previous = parse_record(&record)?;

        let mut retained = 0;
        let mut evicted = Vec::new();
        for request in content.keys().await? {
            let key = stored_resource_key(&self.origin, &request.url);
            if self.manifest.retains(&previous, &key) {
                retained += 1;
            } else {
                content.delete(&request).await?;
                tracing::debug!(key = %key, "evicted stale resource");
                evicted.push(key);
            }
        }

        let promoted = copy_all(&temp, &content).await?;
        self.storage.delete(&self.stores.temp).await?;
        self.persist_manifest(&manifests).await?;

        Ok(ActivationReport { path: ActivationPath::Upgrade, retained, evicted, promoted })
    }

    async fn persist_manifest(&self, manifests: &S::Store) -> Result<(), Error> {
        let request = self.manifest_record_request();
        let mut record = Response::new(&request.url, 200, self.manifest.to_json()?);
        record.headers.push(("content-type".into(), "application/json".into()));
        manifests.put(&request, &record).await
    }

    /// Delete every store this worker owns. Failures are logged, not returned.
    async fn wipe(&self) {
        for name in [&self.stores.content, &self.stores.temp, &self.stores.manifest] {
            if let Err(err) = self.storage.delete(name).await {
                tracing::warn!(store = %name, error = %err, "failed to delete store during reset");
            }
        }
    }

    /// The manifest persisted by the last successful activation, if any.
    pub async fn persisted_manifest(&self) -> Result<Option<ResourceManifest>, Error> {
        if !self.storage.has(&self.stores.manifest).await? {
            return Ok(None);
        }
        let manifests = self.storage.open(&self.stores.manifest).await?;
        match manifests.match_request(&self.manifest_record_request()).await? {
            Some(record) => parse_record(&record).map(Some),
            None => Ok(None),
        }
    }
}

fn parse_record(record: &Response) -> Result<ResourceManifest, Error> {
    let json = std::str::from_utf8(&record.body).map_err(|e| Error::ManifestCorrupt(e.to_string()))?;
    ResourceManifest::from_json(json)
}
