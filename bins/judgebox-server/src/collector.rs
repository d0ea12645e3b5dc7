/// Result Collector - Per-Case Results to One Response
///
/// **Core Responsibility:**
/// Merge ordered per-test-case results into a single response.
///
/// **Critical Properties:**
/// - Knows nothing about processes or containers
/// - Pure function: [RunResult] -> ExecutionResponse
///
/// **Short-Circuit Rule:**
/// The first case carrying an error sets the response status and
/// diagnostic and ends the outputs list there; earlier successful
/// outputs remain valid. Aggregate metrics fold over every case walked,
/// including the failing one.
use judgebox_common::types::{
    ExecutionResponse, ExecutionStatus, ResourceMetrics, RunOutcome, RunResult,
};

pub fn collect(results: &[RunResult]) -> ExecutionResponse {
    let mut outputs = Vec::with_capacity(results.len());
    let mut metrics = ResourceMetrics::default();

    for result in results {
        metrics.max_time_millis = metrics.max_time_millis.max(result.elapsed_millis);
        if let Some(memory) = result.peak_memory_bytes {
            metrics.max_memory_bytes =
                Some(metrics.max_memory_bytes.unwrap_or(0).max(memory));
        }

        match result.outcome {
            RunOutcome::Success => outputs.push(result.stdout.trim().to_string()),
            // Timeout cases carry a distinct time-limit message in stderr,
            // so the diagnostic distinguishes them from runtime errors.
            RunOutcome::RuntimeError | RunOutcome::Timeout => {
                return ExecutionResponse {
                    status: ExecutionStatus::RuntimeFailure,
                    outputs,
                    diagnostic_message: Some(result.stderr.trim().to_string()),
                    metrics,
                };
            }
        }
    }

    ExecutionResponse {
        status: ExecutionStatus::Success,
        outputs,
        diagnostic_message: None,
        metrics,
    }
}
