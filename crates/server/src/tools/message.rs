//! sw_message tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use precache_core::WorkerHandle;
use precache_core::worker::Message;

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message payload: "skipWaiting" or "downloadOffline".
    pub data: String,
}

/// Implementation of the sw_message tool.
///
/// Unknown payloads are rejected with an invalid-params error.
pub async fn message_impl(worker: &WorkerHandle, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let message: Message = params.data.parse()?;
    let outcome = worker.message(message).await?;
    json_result(&outcome)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{StaticNetwork, output, start};
    use super::*;
    use precache_core::worker::{LifecycleSignal, MessageOutcome};
    use rmcp::model::ErrorCode;

    const BUNDLE: &str = r#"{"resources": {"a.js": "h1", "b.css": "h2"}, "shell": []}"#;

    fn params(data: &str) -> SwMessageParams {
        SwMessageParams { data: data.to_string() }
    }

    #[tokio::test]
    async fn test_skip_waiting_message() {
        let worker = start(BUNDLE, StaticNetwork { body: "x", online: true });
        let mut signals = worker.subscribe();

        let outcome: MessageOutcome = output(&message_impl(&worker, params("skipWaiting")).await.unwrap());

        assert_eq!(outcome, MessageOutcome::SkippedWaiting);
        assert_eq!(signals.recv().await.unwrap(), LifecycleSignal::SkipWaiting);
    }

    #[tokio::test]
    async fn test_download_offline_message() {
        let worker = start(BUNDLE, StaticNetwork { body: "x", online: true });

        let outcome: MessageOutcome = output(&message_impl(&worker, params("downloadOffline")).await.unwrap());

        match outcome {
            MessageOutcome::Downloaded { mut fetched } => {
                fetched.sort();
                assert_eq!(fetched, vec!["a.js".to_string(), "b.css".to_string()]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_message_rejected() {
        let worker = start(BUNDLE, StaticNetwork { body: "x", online: true });

        let err = message_impl(&worker, params("reload")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode(-32602));
    }
}
