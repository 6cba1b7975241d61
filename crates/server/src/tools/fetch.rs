//! sw_fetch tool implementation.
//!
//! Routes a request through the worker. Requests the worker does not
//! intercept are fetched from the network directly, as a page would.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;
use precache_core::worker::ResponseSource;
use precache_core::{FetchDisposition, Method, Network, Request, Response, WorkerHandle};

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL to request.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// How the response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FetchSource {
    Cache,
    Network,
    Passthrough,
}

impl From<ResponseSource> for FetchSource {
    fn from(source: ResponseSource) -> Self {
        match source {
            ResponseSource::Cache => FetchSource::Cache,
            ResponseSource::Network => FetchSource::Network,
        }
    }
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub source: FetchSource,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Body length in bytes.
    pub bytes: usize,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
}

impl SwFetchOutput {
    fn new(source: FetchSource, response: &Response) -> Self {
        Self {
            source,
            url: response.url.clone(),
            status: response.status,
            content_type: response.header("content-type").map(str::to_string),
            bytes: response.body.len(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }
    }
}

pub async fn fetch_impl<N: Network>(
    worker: &WorkerHandle, network: &N, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    let url = params.url.trim();
    if url.is_empty() {
        return Err(ToolError::InvalidInput("url is required".to_string()).into());
    }
    let method = params.method.as_deref().map(Method::parse).unwrap_or(Method::Get);
    let request = Request::new(method, url);

    let output = match worker.fetch(request.clone()).await? {
        FetchDisposition::Respond { response, source } => SwFetchOutput::new(source.into(), &response),
        FetchDisposition::Passthrough => {
            let response = network.fetch(&request).await?;
            SwFetchOutput::new(FetchSource::Passthrough, &response)
        }
    };

    tracing::debug!(url = %output.url, source = ?output.source, status = output.status, "sw_fetch");
    json_result(&output)
}
