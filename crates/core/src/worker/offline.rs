//! Offline prefetch: complete the content store to cover the manifest.

use std::collections::HashSet;

use super::ServiceWorker;
use crate::Error;
use crate::cache::{CacheStorage, CacheStore, add_all};
use crate::http::Request;
use crate::manifest::stored_resource_key;
use crate::network::Network;

impl<S: CacheStorage, N: Network> ServiceWorker<S, N> {
    /// Fetch every manifest resource not yet in the content store.
    ///
    /// One all-or-nothing batch; returns the keys that were fetched.
    ///
    /// # Errors
    ///
    /// Returns `Error::PrefetchFailed` if the store cannot be read or any
    /// fetch in the batch fails.
    pub async fn download_offline(&self) -> Result<Vec<String>, Error> {
        self.prefetch_missing()
            .await
            .map_err(|e| Error::PrefetchFailed(e.to_string()))
    }

    async fn prefetch_missing(&self) -> Result<Vec<String>, Error> {
        let content = self.storage.open(&self.stores.content).await?;

        let present: HashSet<String> = content
            .keys()
            .await?
            .iter()
            .map(|request| stored_resource_key(&self.origin, &request.url))
            .collect();

        let missing: Vec<String> = self
            .manifest
            .keys()
            .filter(|key| !present.contains(*key))
            .map(str::to_string)
            .collect();

        let requests: Vec<Request> = missing.iter().map(|key| self.resource_request(key)).collect();
        add_all(&content, &self.network, &requests).await?;

        tracing::info!(fetched = missing.len(), already_cached = present.len(), "offline prefetch complete");
        Ok(missing)
    }
}
