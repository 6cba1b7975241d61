//! The cache store contract and bulk helpers shared by every backend.

use futures_util::future::try_join_all;

use crate::Error;
use crate::http::{Request, Response};
use crate::network::Network;

/// One named key→response store.
///
/// Requests are identified by URL. Writes to the same URL are
/// last-write-wins. Once the store has been deleted through its
/// [`CacheStorage`], reads on an old handle see nothing and writes fail with
/// `Error::StoreUnavailable`.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Name the store was opened under.
    fn name(&self) -> &str;

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error>;

    async fn put(&self, request: &Request, response: &Response) -> Result<(), Error>;

    /// Remove one entry. Returns whether it existed.
    async fn delete(&self, request: &Request) -> Result<bool, Error>;

    /// Every resident request, as plain GETs.
    async fn keys(&self) -> Result<Vec<Request>, Error>;
}

/// Registry of named stores.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    type Store: CacheStore + 'static;

    /// Open a store, creating it if absent.
    async fn open(&self, name: &str) -> Result<Self::Store, Error>;

    /// Delete a store and all of its entries. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    async fn has(&self, name: &str) -> Result<bool, Error>;

    async fn names(&self) -> Result<Vec<String>, Error>;
}

/// Fetch every request and store the responses, all or nothing.
///
/// All fetches complete before anything is written; a transport error or a
/// non-ok status aborts the batch with the store untouched.
pub async fn add_all<S, N>(store: &S, network: &N, requests: &[Request]) -> Result<usize, Error>
where
    S: CacheStore + ?Sized,
    N: Network + ?Sized,
{
    let responses = try_join_all(requests.iter().map(|request| async move {
        let response = network.fetch(request).await?;
        if !response.is_ok() {
            return Err(Error::HttpError(format!("{} returned status {}", request.url, response.status)));
        }
        Ok(response)
    }))
    .await?;

    for (request, response) in requests.iter().zip(&responses) {
        store.put(request, response).await?;
    }

    tracing::debug!(store = store.name(), count = responses.len(), "stored batch");
    Ok(responses.len())
}

/// Copy every entry of `from` into `to`, overwriting same-URL entries.
pub async fn copy_all<A, B>(from: &A, to: &B) -> Result<usize, Error>
where
    A: CacheStore + ?Sized,
    B: CacheStore + ?Sized,
{
    let mut copied = 0;
    for request in from.keys().await? {
        if let Some(response) = from.match_request(&request).await? {
            to.put(&request, &response).await?;
            copied += 1;
        }
    }
    Ok(copied)
}
