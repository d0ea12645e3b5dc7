/// Sandbox Pipeline - High-Level Orchestration
///
/// **Responsibility:**
/// Coordinate stage -> compile -> run -> collect -> teardown for one
/// request, against whichever execution backend was configured.
///
/// **Guarantees:**
/// - The workspace is released on every path, success or failure.
/// - Every failure becomes a fully-formed `ExecutionResponse`; the HTTP
///   layer never sees a raw error.
use crate::collector;
use crate::compiler::{self, CompileResult};
use crate::error::SandboxError;
use crate::executor::SandboxExecutor;
use crate::workspace::{Workspace, WorkspaceManager};
use judgebox_common::types::{ExecutionRequest, ExecutionResponse, ExecutionStatus};
use std::time::Instant;
use tracing::{error, info};

pub async fn execute(
    request: &ExecutionRequest,
    executor: &dyn SandboxExecutor,
    workspaces: &WorkspaceManager,
) -> ExecutionResponse {
    let start = Instant::now();

    let workspace = match workspaces.stage(&request.source_code).await {
        Ok(workspace) => workspace,
        Err(e) => {
            error!(error = %e, "Failed to stage workspace");
            return ExecutionResponse::failure(
                ExecutionStatus::InfraFailure,
                format!("failed to stage workspace: {}", e),
            );
        }
    };

    let response = run_stages(request, &workspace, executor)
        .await
        .unwrap_or_else(|e| {
            error!(workspace_id = %workspace.id(), error = %e, "Pipeline aborted");
            e.into_response()
        });

    // Teardown must not mask the computed result; release only logs.
    workspaces.release(&workspace).await;

    info!(
        workspace_id = %workspace.id(),
        status = ?response.status,
        cases = response.outputs.len(),
        total_ms = start.elapsed().as_millis() as u64,
        "Request finished"
    );
    response
}

async fn run_stages(
    request: &ExecutionRequest,
    workspace: &Workspace,
    executor: &dyn SandboxExecutor,
) -> Result<ExecutionResponse, SandboxError> {
    match compiler::compile(workspace).await? {
        CompileResult::Failure { diagnostics } => {
            // Expected user error: surface the toolchain's output, skip
            // execution entirely (no session is ever created).
            return Ok(ExecutionResponse::failure(
                ExecutionStatus::CompileFailure,
                diagnostics,
            ));
        }
        CompileResult::Success => {}
    }

    let results = executor.run_all(workspace, &request.inputs).await?;
    Ok(collector::collect(&results))
}
