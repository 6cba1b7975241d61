//! Fetch interception: route manifest resources through the content store.

use serde::{Deserialize, Serialize};

use super::ServiceWorker;
use crate::Error;
use crate::cache::{CacheStorage, CacheStore};
use crate::http::{Request, Response};
use crate::manifest::{ROOT_KEY, request_resource_key};
use crate::network::Network;

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
}

/// What the worker decided to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDisposition {
    /// Not a manifest resource; the host should use plain network handling.
    Passthrough,
    Respond { response: Response, source: ResponseSource },
}

impl<S: CacheStorage, N: Network> ServiceWorker<S, N> {
    /// Decide how to answer a request.
    ///
    /// Only GETs for keys listed in the manifest are intercepted. The entry
    /// document (`/`) is served online-first; everything else cache-first,
    /// populating the content store lazily from ok responses.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchDisposition, Error> {
        if !request.is_get() {
            return Ok(FetchDisposition::Passthrough);
        }

        let request = self.canonical_request(request);
        let key = request_resource_key(&self.origin, &request.url);
        if !self.manifest.contains(&key) {
            tracing::trace!(url = %request.url, "not a manifest resource");
            return Ok(FetchDisposition::Passthrough);
        }

        if key == ROOT_KEY {
            return self.online_first(&request).await;
        }
        self.cache_first(&request).await
    }

    /// Store identity of a request: the fragment is dropped and the bare
    /// origin gains its trailing `/`, so every route of the entry document
    /// shares one entry.
    fn canonical_request(&self, request: &Request) -> Request {
        let url = request.url.split_once('#').map_or(request.url.as_str(), |(base, _)| base);
        let url = if url == self.origin { format!("{url}/") } else { url.to_string() };
        Request { url, ..request.clone() }
    }

    async fn cache_first(&self, request: &Request) -> Result<FetchDisposition, Error> {
        let content = self.storage.open(&self.stores.content).await?;

        if let Some(response) = content.match_request(request).await? {
            tracing::debug!("cache hit for {}", request.url);
            return Ok(FetchDisposition::Respond { response, source: ResponseSource::Cache });
        }

        let response = self.network.fetch(request).await?;
        if response.is_ok() {
            if let Err(err) = content.put(request, &response).await {
                tracing::warn!(url = %request.url, error = %err, "failed to populate cache");
            }
        } else {
            tracing::debug!(url = %request.url, status = response.status, "not caching non-ok response");
        }

        Ok(FetchDisposition::Respond { response, source: ResponseSource::Network })
    }

    /// Network first; the cached copy is only a fallback for network errors.
    async fn online_first(&self, request: &Request) -> Result<FetchDisposition, Error> {
        match self.network.fetch(request).await {
            Ok(response) => {
                match self.storage.open(&self.stores.content).await {
                    Ok(content) => {
                        if let Err(err) = content.put(request, &response).await {
                            tracing::warn!(url = %request.url, error = %err, "failed to refresh entry document");
                        }
                    }
                    Err(err) => tracing::warn!(error = %err, "content store unavailable"),
                }
                Ok(FetchDisposition::Respond { response, source: ResponseSource::Network })
            }
            Err(network_err) => {
                tracing::warn!(url = %request.url, error = %network_err, "network failed, falling back to cache");
                match self.cached(request).await {
                    Ok(Some(response)) => Ok(FetchDisposition::Respond { response, source: ResponseSource::Cache }),
                    Ok(None) => Err(network_err),
                    Err(err) => {
                        tracing::warn!(error = %err, "cache fallback failed");
                        Err(network_err)
                    }
                }
            }
        }
    }

    async fn cached(&self, request: &Request) -> Result<Option<Response>, Error> {
        let content = self.storage.open(&self.stores.content).await?;
        content.match_request(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FakeNetwork, bundle, cached_body, cached_urls, worker};
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::http::Method;

    fn resources() -> [(&'static str, &'static str); 3] {
        [("/", "h0"), ("main.js", "h1"), ("assets/logo.png", "h2")]
    }

    fn respond(disposition: FetchDisposition) -> (String, ResponseSource) {
        match disposition {
            FetchDisposition::Respond { response, source } => {
                (String::from_utf8_lossy(&response.body).into_owned(), source)
            }
            FetchDisposition::Passthrough => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn test_non_get_is_never_intercepted() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        let worker = worker(bundle(&resources(), &[]), &storage, &network);

        let request = Request::new(Method::parse("POST"), "https://app.test/main.js");
        assert_eq!(worker.handle_fetch(&request).await.unwrap(), FetchDisposition::Passthrough);
        assert!(network.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unlisted_key_falls_through() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        let worker = worker(bundle(&resources(), &[]), &storage, &network);

        let request = Request::get("https://app.test/api/data");
        assert_eq!(worker.handle_fetch(&request).await.unwrap(), FetchDisposition::Passthrough);
        assert!(network.requests().is_empty());
        assert!(!storage.has("app-cache").await.unwrap());
    }

    #[tokio::test]
    async fn test_cache_first_populates_then_serves_from_cache() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.serve("https://app.test/main.js", "main");
        let worker = worker(bundle(&resources(), &[]), &storage, &network);
        let request = Request::get("https://app.test/main.js");

        let first = respond(worker.handle_fetch(&request).await.unwrap());
        let second = respond(worker.handle_fetch(&request).await.unwrap());

        assert_eq!(first, ("main".to_string(), ResponseSource::Network));
        assert_eq!(second, ("main".to_string(), ResponseSource::Cache));
        assert_eq!(network.calls_to("https://app.test/main.js"), 1);
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_error_status() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.serve_status("https://app.test/assets/logo.png", 500, "oops");
        let worker = worker(bundle(&resources(), &[]), &storage, &network);

        let disposition = worker.handle_fetch(&Request::get("https://app.test/assets/logo.png")).await.unwrap();

        match disposition {
            FetchDisposition::Respond { response, source } => {
                assert_eq!(response.status, 500);
                assert_eq!(source, ResponseSource::Network);
            }
            FetchDisposition::Passthrough => panic!("expected a response"),
        }
        assert!(cached_urls(&storage, "app-cache").await.is_empty());
    }

    #[tokio::test]
    async fn test_cache_first_network_error_leaves_cache_alone() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.fail("https://app.test/main.js");
        let worker = worker(bundle(&resources(), &[]), &storage, &network);

        let result = worker.handle_fetch(&Request::get("https://app.test/main.js")).await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert!(cached_urls(&storage, "app-cache").await.is_empty());
    }

    #[tokio::test]
    async fn test_versioned_request_matches_manifest_key() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.serve("https://app.test/main.js?v=42", "main");
        let worker = worker(bundle(&resources(), &[]), &storage, &network);

        let (body, source) = respond(worker.handle_fetch(&Request::get("https://app.test/main.js?v=42")).await.unwrap());

        assert_eq!(body, "main");
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(cached_urls(&storage, "app-cache").await, vec!["https://app.test/main.js?v=42"]);
    }

    #[tokio::test]
    async fn test_entry_document_online_refreshes_cache() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.serve("https://app.test/", "<html>v1</html>");
        let worker = worker(bundle(&resources(), &[]), &storage, &network);
        let request = Request::get("https://app.test/");

        respond(worker.handle_fetch(&request).await.unwrap());
        network.serve("https://app.test/", "<html>v2</html>");
        let (body, source) = respond(worker.handle_fetch(&request).await.unwrap());

        assert_eq!(body, "<html>v2</html>");
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(cached_body(&storage, "app-cache", "https://app.test/").await.as_deref(), Some("<html>v2</html>"));
    }

    #[tokio::test]
    async fn test_entry_document_offline_serves_stale_copy() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.serve("https://app.test/", "<html>cached</html>");
        let worker = worker(bundle(&resources(), &[]), &storage, &network);
        let request = Request::get("https://app.test/");
        respond(worker.handle_fetch(&request).await.unwrap());

        network.set_online(false);
        let (body, source) = respond(worker.handle_fetch(&request).await.unwrap());

        assert_eq!(body, "<html>cached</html>");
        assert_eq!(source, ResponseSource::Cache);
    }

    #[tokio::test]
    async fn test_entry_document_offline_without_copy_fails() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.set_online(false);
        let worker = worker(bundle(&resources(), &[]), &storage, &network);

        let result = worker.handle_fetch(&Request::get("https://app.test/")).await;

        assert!(matches!(result, Err(Error::Network(msg)) if msg.contains("offline")));
    }

    #[tokio::test]
    async fn test_fragment_route_shares_entry_document() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.serve("https://app.test/", "<html>shell</html>");
        let worker = worker(bundle(&resources(), &[]), &storage, &network);

        let (body, source) =
            respond(worker.handle_fetch(&Request::get("https://app.test/#/settings")).await.unwrap());

        assert_eq!(body, "<html>shell</html>");
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(network.calls_to("https://app.test/"), 1);
        assert_eq!(cached_urls(&storage, "app-cache").await, vec!["https://app.test/"]);
    }

    #[tokio::test]
    async fn test_offline_fragment_route_serves_cached_entry_document() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.serve("https://app.test/", "<html>cached</html>");
        let worker = worker(bundle(&resources(), &["/"]), &storage, &network);
        worker.install().await.unwrap();
        worker.activate().await.unwrap();

        network.set_online(false);
        let (body, source) = respond(worker.handle_fetch(&Request::get("https://app.test/#/about")).await.unwrap());

        assert_eq!(body, "<html>cached</html>");
        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(cached_urls(&storage, "app-cache").await, vec!["https://app.test/"]);
    }

    #[tokio::test]
    async fn test_offline_bare_origin_serves_cached_entry_document() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.serve("https://app.test/", "<html>cached</html>");
        let worker = worker(bundle(&resources(), &["/"]), &storage, &network);
        worker.install().await.unwrap();
        worker.activate().await.unwrap();

        network.set_online(false);
        let (body, source) = respond(worker.handle_fetch(&Request::get("https://app.test")).await.unwrap());

        assert_eq!(body, "<html>cached</html>");
        assert_eq!(source, ResponseSource::Cache);
    }

    #[tokio::test]
    async fn test_fragment_routes_survive_reconciliation() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        network.serve("https://app.test/", "<html>v1</html>");
        let v1 = worker(bundle(&resources(), &["/"]), &storage, &network);
        v1.install().await.unwrap();
        v1.activate().await.unwrap();
        respond(v1.handle_fetch(&Request::get("https://app.test/#/settings")).await.unwrap());

        let v2 = worker(bundle(&resources(), &["/"]), &storage, &network);
        v2.install().await.unwrap();
        let report = v2.activate().await.unwrap();

        assert!(report.evicted.is_empty());
        assert_eq!(v2.status().await.unwrap().content_entries, 1);
    }

    #[tokio::test]
    async fn test_entry_document_not_listed_falls_through() {
        let storage = MemoryStorage::new();
        let network = FakeNetwork::new();
        let worker = worker(bundle(&[("main.js", "h1")], &[]), &storage, &network);

        let disposition = worker.handle_fetch(&Request::get("https://app.test/")).await.unwrap();
        assert_eq!(disposition, FetchDisposition::Passthrough);
    }
}
