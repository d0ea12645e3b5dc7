/// Execution Backend Abstraction
///
/// **Critical Architectural Boundary:**
/// - A backend knows HOW to isolate and run the compiled artifact
///   (OS process limits vs. a full container).
/// - A backend does NOT aggregate results or decide short-circuiting;
///   it attempts test cases and reports raw `RunResult`s.
///
/// The pipeline depends only on this trait, so isolation backends are
/// swappable without touching orchestration or collection.
use crate::config::{Backend, SandboxConfig};
use crate::container::ContainerExecutor;
use crate::error::SandboxError;
use crate::host::HostProcessExecutor;
use crate::workspace::Workspace;
use async_trait::async_trait;
use judgebox_common::types::RunResult;
use std::sync::Arc;

/// Capability interface over the two isolation backends.
#[async_trait]
pub trait SandboxExecutor: Send + Sync {
    /// Run the workspace's compiled artifact once per input string, in
    /// the exact order supplied. Returns one `RunResult` per case
    /// attempted; infrastructure failures abort the whole batch.
    async fn run_all(
        &self,
        workspace: &Workspace,
        inputs: &[String],
    ) -> Result<Vec<RunResult>, SandboxError>;
}

/// Build the configured backend. Connecting to the container runtime is
/// the only fallible step and happens once, at startup.
pub fn build_executor(config: &SandboxConfig) -> Result<Arc<dyn SandboxExecutor>, SandboxError> {
    match config.backend {
        Backend::Host => Ok(Arc::new(HostProcessExecutor::new(config))),
        Backend::Container => Ok(Arc::new(ContainerExecutor::new(config)?)),
    }
}

/// Split one test-case input string into process arguments the way the
/// judge contract defines it: trimmed, whitespace-separated.
pub fn split_input(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_input_trims_and_splits_on_whitespace() {
        assert_eq!(split_input("  4   4 "), vec!["4", "4"]);
        assert_eq!(split_input("1 3"), vec!["1", "3"]);
        assert!(split_input("   ").is_empty());
        assert!(split_input("").is_empty());
    }
}
