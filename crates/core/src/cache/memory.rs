//! In-memory named stores.
//!
//! Uses a HashMap of stores behind a tokio RwLock. Nothing survives the
//! process; hosts without a database and the test suites use it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::store::{CacheStorage, CacheStore};
use crate::Error;
use crate::http::{Request, Response};

type Entries = BTreeMap<String, Response>;
type Registry = Arc<RwLock<HashMap<String, Entries>>>;

/// Store registry held in process memory. Clones share the same stores.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    stores: Registry,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Handle to one named in-memory store.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    stores: Registry,
    name: String,
}

#[async_trait::async_trait]
impl CacheStorage for MemoryStorage {
    type Store = MemoryStore;

    async fn open(&self, name: &str) -> Result<MemoryStore, Error> {
        self.stores.write().await.entry(name.to_string()).or_default();
        Ok(MemoryStore { stores: Arc::clone(&self.stores), name: name.to_string() })
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        Ok(self.stores.write().await.remove(name).is_some())
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(self.stores.read().await.contains_key(name))
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = self.stores.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let stores = self.stores.read().await;
        Ok(stores.get(&self.name).and_then(|entries| entries.get(&request.url)).cloned())
    }

    async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        let entries = stores
            .get_mut(&self.name)
            .ok_or_else(|| Error::StoreUnavailable(format!("store {} has been deleted", self.name)))?;
        entries.insert(request.url.clone(), response.clone());
        Ok(())
    }

    async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let mut stores = self.stores.write().await;
        Ok(stores
            .get_mut(&self.name)
            .is_some_and(|entries| entries.remove(&request.url).is_some()))
    }

    async fn keys(&self) -> Result<Vec<Request>, Error> {
        let stores = self.stores.read().await;
        Ok(stores
            .get(&self.name)
            .map(|entries| entries.keys().cloned().map(Request::get).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_and_shares() {
        let storage = MemoryStorage::new();
        let a = storage.open("app-cache").await.unwrap();
        let b = storage.open("app-cache").await.unwrap();
        let request = Request::get("https://app.test/main.js");

        a.put(&request, &Response::new(&request.url, 200, "x")).await.unwrap();

        assert!(b.match_request(&request).await.unwrap().is_some());
        assert!(storage.has("app-cache").await.unwrap());
    }

    #[tokio::test]
    async fn test_deleted_store_handle() {
        let storage = MemoryStorage::new();
        let store = storage.open("temp-cache").await.unwrap();
        let request = Request::get("https://app.test/main.js");
        store.put(&request, &Response::new(&request.url, 200, "x")).await.unwrap();

        assert!(storage.delete("temp-cache").await.unwrap());

        assert!(store.match_request(&request).await.unwrap().is_none());
        assert!(store.keys().await.unwrap().is_empty());
        assert!(!store.delete(&request).await.unwrap());
        let result = store.put(&request, &Response::new(&request.url, 200, "x")).await;
        assert!(matches!(result, Err(Error::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_names_sorted() {
        let storage = MemoryStorage::new();
        storage.open("temp-cache").await.unwrap();
        storage.open("app-cache").await.unwrap();
        assert_eq!(storage.names().await.unwrap(), vec!["app-cache".to_string(), "temp-cache".to_string()]);
    }
}
