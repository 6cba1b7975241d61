//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use precache_core::WorkerHandle;
use precache_core::worker::{ActivationReport, WorkerState};

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallOutput {
    /// Shell resources staged in the temp store.
    pub staged: usize,

    /// Worker state after install.
    pub state: WorkerState,

    /// Whether the worker asked to activate without waiting.
    pub skip_waiting: bool,
}

pub async fn install_impl(worker: &WorkerHandle) -> Result<CallToolResult, McpError> {
    let staged = worker.install().await?;
    let status = worker.status().await?;

    json_result(&SwInstallOutput { staged, state: status.state, skip_waiting: status.skip_waiting })
}

/// Implementation of the sw_activate tool; the output is the activation report.
pub async fn activate_impl(worker: &WorkerHandle) -> Result<CallToolResult, McpError> {
    let report: ActivationReport = worker.activate().await?;
    json_result(&report)
}
