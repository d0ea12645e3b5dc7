//! Wire types shared between the sandbox server and its clients.
//!
//! Field names follow the JSON contract of the judge service
//! (camelCase: `sourceCode`, `diagnosticMessage`, `maxTimeMillis`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language tag for a submission. The toolchain currently supports Java
/// only; the enum keeps the contract typed and leaves room to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Java => write!(f, "java"),
        }
    }
}

/// One execution request: source text plus an ordered list of test-case
/// input-argument strings. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub language: Language,
    pub source_code: String,
    #[serde(default)]
    pub inputs: Vec<String>,
}

/// Classification of a single test-case run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    RuntimeError,
    Timeout,
}

/// Raw result of one test case. Produced by an execution backend,
/// consumed by the collector, immutable after creation.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub stdout: String,
    pub stderr: String,
    pub elapsed_millis: u64,
    /// Peak resident memory observed while the case ran. `None` on the
    /// host backend, which has no memory instrumentation.
    pub peak_memory_bytes: Option<u64>,
    pub outcome: RunOutcome,
}

/// Overall request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Every test case completed without error.
    Success,
    /// The toolchain rejected the submission; diagnostics carry its output.
    CompileFailure,
    /// A test case failed (non-empty stderr or timeout); outputs stop there.
    RuntimeFailure,
    /// Sandbox-side failure (filesystem, container runtime). Reflects
    /// platform health, not submission quality.
    InfraFailure,
}

/// Aggregate resource usage across the cases actually attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetrics {
    pub max_time_millis: u64,
    pub max_memory_bytes: Option<u64>,
}

/// The response for one request. Always fully formed: every failure path
/// produces one of these rather than a raw error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub status: ExecutionStatus,
    /// One entry per successfully completed test case, in input order.
    /// May be shorter than the input list: accumulation stops at the
    /// first failing case.
    pub outputs: Vec<String>,
    pub diagnostic_message: Option<String>,
    pub metrics: ResourceMetrics,
}

impl ExecutionResponse {
    /// Response for a request that never produced any case results.
    pub fn failure(status: ExecutionStatus, diagnostic: impl Into<String>) -> Self {
        Self {
            status,
            outputs: Vec::new(),
            diagnostic_message: Some(diagnostic.into()),
            metrics: ResourceMetrics::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_field_names() {
        let request: ExecutionRequest = serde_json::from_str(
            r#"{"language":"java","sourceCode":"class Main {}","inputs":["4 4","1 3"]}"#,
        )
        .unwrap();
        assert_eq!(request.language, Language::Java);
        assert_eq!(request.inputs, vec!["4 4", "1 3"]);
    }

    #[test]
    fn inputs_default_to_empty() {
        let request: ExecutionRequest =
            serde_json::from_str(r#"{"language":"java","sourceCode":""}"#).unwrap();
        assert!(request.inputs.is_empty());
    }

    #[test]
    fn response_serializes_contract_field_names() {
        let response = ExecutionResponse {
            status: ExecutionStatus::Success,
            outputs: vec!["8".to_string()],
            diagnostic_message: None,
            metrics: ResourceMetrics {
                max_time_millis: 42,
                max_memory_bytes: Some(1024),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "Success");
        assert_eq!(json["metrics"]["maxTimeMillis"], 42);
        assert_eq!(json["metrics"]["maxMemoryBytes"], 1024);
        assert_eq!(json["diagnosticMessage"], serde_json::Value::Null);
    }
}
