//! Install stage: stage the application shell.

use super::{LifecycleSignal, ServiceWorker, WorkerState};
use crate::Error;
use crate::cache::{CacheStorage, add_all};
use crate::http::{CacheMode, Request};
use crate::network::Network;

impl<S: CacheStorage, N: Network> ServiceWorker<S, N> {
    /// Fetch every shell resource fresh into the temp store.
    ///
    /// Asks the host to skip waiting before fetching. All-or-nothing: if any
    /// shell resource fails, nothing is staged, the worker becomes
    /// `Redundant`, and `Error::InstallFailed` is returned. Returns the
    /// number of staged resources.
    pub async fn install(&self) -> Result<usize, Error> {
        {
            let mut state = self.state.write().await;
            if *state != WorkerState::Parsed {
                return Err(Error::InvalidState(format!("cannot install from {:?}", *state)));
            }
            *state = WorkerState::Installing;
        }

        self.emit(LifecycleSignal::SkipWaiting);

        let requests: Vec<Request> = self
            .shell
            .iter()
            .map(|key| self.resource_request(key).with_cache_mode(CacheMode::Reload))
            .collect();

        let staged = async {
            let temp = self.storage.open(&self.stores.temp).await?;
            add_all(&temp, &self.network, &requests).await
        }
        .await;

        match staged {
            Ok(count) => {
                self.set_state(WorkerState::Installed).await;
                tracing::info!(staged = count, store = %self.stores.temp, "install complete");
                Ok(count)
            }
            Err(err) => {
                self.set_state(WorkerState::Redundant).await;
                tracing::error!(error = %err, "install failed");
                Err(Error::InstallFailed(err.to_string()))
            }
        }
    }
}
