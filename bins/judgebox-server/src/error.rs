// Sandbox-side failure taxonomy. User-visible outcomes (compile errors,
// runtime errors, timeouts) are not errors; they travel as results.

use judgebox_common::types::{ExecutionResponse, ExecutionStatus};
use thiserror::Error;

/// Infrastructure failures of the sandbox itself. Every variant maps to
/// `ExecutionStatus::InfraFailure`: these reflect platform health, not
/// the quality of the submission.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("workspace I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("container runtime failure: {0}")]
    Runtime(#[from] bollard::errors::Error),

    #[error("sandbox failure: {0}")]
    Infra(String),
}

impl SandboxError {
    /// Convert into the uniform response the boundary layer expects.
    /// The pipeline never lets a raw error escape.
    pub fn into_response(self) -> ExecutionResponse {
        ExecutionResponse::failure(ExecutionStatus::InfraFailure, self.to_string())
    }
}
