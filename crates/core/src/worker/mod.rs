//! The offline-cache worker.
//!
//! One `ServiceWorker` corresponds to one deployment: it carries the
//! compiled-in manifest and shell list and drives three named stores through
//! the lifecycle:
//!
//! - install: fetch the shell resources fresh into the temp store
//! - activate: reconcile the content store against the previous manifest,
//!   promote the temp store, persist the new manifest
//! - fetch: route requests for manifest resources through the content store
//! - message: skip waiting, or top up the content store for offline use
//!
//! Events are normally delivered through a [`WorkerHandle`] returned by
//! [`spawn`], which runs each event on its own task.

pub mod activate;
pub mod install;
pub mod intercept;
pub mod message;
pub mod offline;
pub mod runtime;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, broadcast};

use crate::cache::CacheStorage;
use crate::config::AppConfig;
use crate::http::Request;
use crate::manifest::{Bundle, ResourceManifest, resource_url};
use crate::network::Network;

pub use activate::{ActivationPath, ActivationReport};
pub use intercept::{FetchDisposition, ResponseSource};
pub use message::{Message, MessageOutcome};
pub use runtime::{WorkerHandle, spawn};
pub use status::CacheStatus;

/// Key of the persisted manifest record inside the manifest store.
pub const MANIFEST_RECORD_KEY: &str = "manifest";

const SIGNAL_CAPACITY: usize = 16;

/// Names of the three stores a worker operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreNames {
    pub content: String,
    pub temp: String,
    pub manifest: String,
}

impl Default for StoreNames {
    fn default() -> Self {
        Self { content: "app-cache".into(), temp: "temp-cache".into(), manifest: "app-manifest".into() }
    }
}

impl From<&AppConfig> for StoreNames {
    fn from(config: &AppConfig) -> Self {
        Self {
            content: config.content_cache.clone(),
            temp: config.temp_cache.clone(),
            manifest: config.manifest_cache.clone(),
        }
    }
}

/// Lifecycle position of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install or activation failed; this worker will not control clients.
    Redundant,
}

/// Signals a worker sends to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleSignal {
    /// Proceed to activation without waiting for old clients to close.
    SkipWaiting,
    /// Take control of currently open clients.
    ClaimClients,
}

/// A worker bound to one deployment's manifest.
pub struct ServiceWorker<S, N> {
    origin: String,
    manifest: ResourceManifest,
    shell: Vec<String>,
    stores: StoreNames,
    storage: S,
    network: N,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    activation: Mutex<()>,
    signals: broadcast::Sender<LifecycleSignal>,
}

impl<S: CacheStorage, N: Network> ServiceWorker<S, N> {
    /// Create a worker for `origin` (scheme and host, no trailing slash).
    pub fn new(origin: impl Into<String>, bundle: Bundle, storage: S, network: N) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            origin: origin.into(),
            manifest: bundle.resources,
            shell: bundle.shell,
            stores: StoreNames::default(),
            storage,
            network,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            activation: Mutex::new(()),
            signals,
        }
    }

    pub fn with_store_names(mut self, stores: StoreNames) -> Self {
        self.stores = stores;
        self
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn manifest(&self) -> &ResourceManifest {
        &self.manifest
    }

    pub fn store_names(&self) -> &StoreNames {
        &self.stores
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Whether the worker asked its host to skip the waiting phase.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleSignal> {
        self.signals.subscribe()
    }

    async fn set_state(&self, next: WorkerState) {
        let mut state = self.state.write().await;
        tracing::debug!(from = ?*state, to = ?next, "worker state change");
        *state = next;
    }

    fn emit(&self, signal: LifecycleSignal) {
        if signal == LifecycleSignal::SkipWaiting {
            self.skip_waiting.store(true, Ordering::SeqCst);
        }
        // No subscribers is fine; the flag above still records skip-waiting.
        let _ = self.signals.send(signal);
    }

    fn resource_request(&self, key: &str) -> Request {
        Request::get(resource_url(&self.origin, key))
    }

    fn manifest_record_request(&self) -> Request {
        self.resource_request(MANIFEST_RECORD_KEY)
    }
}
