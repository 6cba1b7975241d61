//! Scripted collaborators for worker tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::ServiceWorker;
use crate::Error;
use crate::cache::{CacheStorage, CacheStore, MemoryStorage, MemoryStore};
use crate::http::{Request, Response};
use crate::manifest::{Bundle, ResourceManifest};
use crate::network::Network;

pub(crate) const ORIGIN: &str = "https://app.test";

enum Route {
    Serve(u16, String),
    Fail,
}

/// Network double answering from a route table and recording every request.
pub(crate) struct FakeNetwork {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<Request>>,
    online: AtomicBool,
}

impl FakeNetwork {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            online: AtomicBool::new(true),
        })
    }

    pub(crate) fn serve(&self, url: &str, body: &str) {
        self.serve_status(url, 200, body);
    }

    pub(crate) fn serve_status(&self, url: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Serve(status, body.to_string()));
    }

    pub(crate) fn fail(&self, url: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), Route::Fail);
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| r.url == url).count()
    }

    pub(crate) fn reset_calls(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.online.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }
        match self.routes.lock().unwrap().get(&request.url) {
            Some(Route::Serve(status, body)) => Ok(Response::new(&request.url, *status, body.clone())),
            Some(Route::Fail) => Err(Error::Network(format!("connection reset: {}", request.url))),
            None => Ok(Response::new(&request.url, 404, "not found")),
        }
    }
}

/// Memory storage whose selected stores reject writes.
#[derive(Clone, Default)]
pub(crate) struct FlakyStorage {
    inner: MemoryStorage,
    broken: Arc<Mutex<HashSet<String>>>,
}

impl FlakyStorage {
    pub(crate) fn new(inner: MemoryStorage) -> Self {
        Self { inner, broken: Arc::default() }
    }

    pub(crate) fn break_writes(&self, store: &str) {
        self.broken.lock().unwrap().insert(store.to_string());
    }
}

pub(crate) struct FlakyStore {
    inner: MemoryStore,
    broken: Arc<Mutex<HashSet<String>>>,
}

#[async_trait::async_trait]
impl CacheStorage for FlakyStorage {
    type Store = FlakyStore;

    async fn open(&self, name: &str) -> Result<FlakyStore, Error> {
        Ok(FlakyStore { inner: self.inner.open(name).await?, broken: Arc::clone(&self.broken) })
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.inner.delete(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.inner.has(name).await
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        self.inner.names().await
    }
}

#[async_trait::async_trait]
impl CacheStore for FlakyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.inner.match_request(request).await
    }

    async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        if self.broken.lock().unwrap().contains(self.inner.name()) {
            return Err(Error::StoreUnavailable(format!("disk full writing {}", request.url)));
        }
        self.inner.put(request, response).await
    }

    async fn delete(&self, request: &Request) -> Result<bool, Error> {
        self.inner.delete(request).await
    }

    async fn keys(&self) -> Result<Vec<Request>, Error> {
        self.inner.keys().await
    }
}

pub(crate) fn bundle(resources: &[(&str, &str)], shell: &[&str]) -> Bundle {
    Bundle {
        resources: resources.iter().copied().collect::<ResourceManifest>(),
        shell: shell.iter().map(|s| s.to_string()).collect(),
    }
}

pub(crate) fn worker<S: CacheStorage + Clone>(
    bundle: Bundle, storage: &S, network: &Arc<FakeNetwork>,
) -> ServiceWorker<S, Arc<FakeNetwork>> {
    ServiceWorker::new(ORIGIN, bundle, storage.clone(), Arc::clone(network))
}

/// Body of the entry for `url` in `store`, if present.
pub(crate) async fn cached_body<S: CacheStorage>(storage: &S, store: &str, url: &str) -> Option<String> {
    let store = storage.open(store).await.unwrap();
    store
        .match_request(&Request::get(url))
        .await
        .unwrap()
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
}

/// Sorted URLs resident in `store`.
pub(crate) async fn cached_urls<S: CacheStorage>(storage: &S, store: &str) -> Vec<String> {
    let store = storage.open(store).await.unwrap();
    let mut urls: Vec<String> = store.keys().await.unwrap().into_iter().map(|r| r.url).collect();
    urls.sort();
    urls
}
