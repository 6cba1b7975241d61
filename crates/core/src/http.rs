//! Request and response values exchanged with cache stores and the network.
//!
//! A request's identity inside a store is its URL; the method and cache mode
//! only influence how the worker and the network treat it.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// HTTP method, reduced to what interception cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub enum Method {
    Get,
    Other(String),
}

impl Method {
    /// Parse a method name case-insensitively.
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("GET") { Method::Get } else { Method::Other(name.to_ascii_uppercase()) }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Other(name) => name,
        }
    }
}

/// Directive for intermediary HTTP caches between the worker and the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    #[default]
    Default,
    /// Force a fresh network fetch, bypassing any intermediary cache.
    Reload,
}

/// An outgoing or stored request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub cache_mode: CacheMode,
}

impl Request {
    /// A plain GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: Method::Get, url: url.into(), cache_mode: CacheMode::Default }
    }

    /// A request with an arbitrary method.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), cache_mode: CacheMode::Default }
    }

    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::Get
    }
}

/// A completed HTTP exchange, either fresh from the network or cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Bytes>) -> Self {
        Self { url: url.into(), status, headers: Vec::new(), body: body.into() }
    }

    /// True for 2xx statuses.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("get"), Method::Get);
        assert_eq!(Method::parse("post"), Method::Other("POST".into()));
        assert_eq!(Method::parse("Post").as_str(), "POST");
    }

    #[test]
    fn test_response_is_ok() {
        assert!(Response::new("https://a.test/", 200, "x").is_ok());
        assert!(Response::new("https://a.test/", 204, "").is_ok());
        assert!(!Response::new("https://a.test/", 304, "").is_ok());
        assert!(!Response::new("https://a.test/", 404, "").is_ok());
    }

    #[test]
    fn test_response_header_case_insensitive() {
        let mut response = Response::new("https://a.test/", 200, "x");
        response.headers.push(("Content-Type".into(), "text/html".into()));
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.header("etag"), None);
    }

    #[test]
    fn test_request_cache_mode() {
        let request = Request::get("https://a.test/main.js").with_cache_mode(CacheMode::Reload);
        assert!(request.is_get());
        assert_eq!(request.cache_mode, CacheMode::Reload);
    }
}
