//! The network collaborator contract.

use crate::Error;
use crate::http::{Request, Response};

/// Fetches requests from the network.
///
/// A completed HTTP exchange is `Ok` whatever its status; `Err` means the
/// exchange never completed (DNS, connect, timeout, oversized body).
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

#[async_trait::async_trait]
impl<T: Network + ?Sized> Network for std::sync::Arc<T> {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        (**self).fetch(request).await
    }
}
