//! cache_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use precache_core::WorkerHandle;
use precache_core::worker::CacheStatus;

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    #[serde(flatten)]
    pub status: CacheStatus,

    /// When the report was taken (RFC 3339).
    pub checked_at: String,
}

pub async fn status_impl(worker: &WorkerHandle) -> Result<CallToolResult, McpError> {
    let status = worker.status().await?;
    json_result(&CacheStatusOutput { status, checked_at: chrono::Utc::now().to_rfc3339() })
}

#[cfg(test)]
mod tests {
    use super::super::testing::{StaticNetwork, output, start};
    use super::*;
    use precache_core::worker::WorkerState;

    #[tokio::test]
    async fn test_status_reports_coverage() {
        let worker = start(r#"{"resources": {"/": "h0", "app.js": "h1"}, "shell": ["/"]}"#, StaticNetwork {
            body: "x",
            online: true,
        });
        worker.install().await.unwrap();
        worker.activate().await.unwrap();

        let out: CacheStatusOutput = output(&status_impl(&worker).await.unwrap());

        assert_eq!(out.status.state, WorkerState::Activated);
        assert_eq!(out.status.content_entries, 1);
        assert_eq!(out.status.missing, vec!["app.js".to_string()]);
        assert!(out.status.manifest_current);
        assert!(chrono::DateTime::parse_from_rfc3339(&out.checked_at).is_ok());
    }
}
