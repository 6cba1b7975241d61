//! HTTP fetch client backing the worker's network collaborator.
//!
//! ### Semantics
//! - Any completed exchange is returned, whatever its status; the worker
//!   decides what to cache
//! - `CacheMode::Reload` sends `Cache-Control: no-cache` and
//!   `Pragma: no-cache` so intermediaries revalidate with the origin
//! - Transport failures map to `NETWORK_ERROR`, timeouts to `FETCH_TIMEOUT`
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: configurable, checked against `Content-Length` and
//!   again after download

pub mod url;

use bytes::Bytes;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, normalize_origin, parse_request_url};

use precache_core::config::AppConfig;
use precache_core::{CacheMode, Error, Network, Request, Response};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "precache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 50MB)
    pub max_bytes: usize,

    /// Request timeout (default: 30s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "precache/0.1".to_string(),
            max_bytes: 50 * 1024 * 1024,
            timeout: Duration::from_millis(30_000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// HTTP client implementing [`Network`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn too_large(&self, len: usize) -> Error {
        Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes))
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(err.to_string())
    } else {
        Error::Network(err.to_string())
    }
}

#[async_trait::async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let url = parse_request_url(&request.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {e}", request.method.as_str())))?;

        let mut builder = self.http.request(method, url.clone());
        if request.cache_mode == CacheMode::Reload {
            builder = builder
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status();
        if let Some(len) = response.content_length() {
            match usize::try_from(len) {
                Ok(len) if len > self.config.max_bytes => return Err(self.too_large(len)),
                Ok(_) => {}
                Err(_) => return Err(Error::FetchTooLarge(format!("{len} bytes exceeds addressable memory"))),
            }
        }

        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let body: Bytes = response.bytes().await.map_err(transport_error)?;
        if body.len() > self.config.max_bytes {
            return Err(self.too_large(body.len()));
        }

        tracing::debug!(
            "fetched {} -> {} ({}) in {}ms ({} bytes)",
            url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response { url: final_url.to_string(), status: status.as_u16(), headers, body })
    }
}
