/// End-to-end pipeline tests
///
/// These walk the full stage -> compile -> run -> collect -> teardown
/// path against a real backend, so they are ignored by default:
/// host-backend tests need a JDK, container-backend tests need a Docker
/// daemon with the sandbox image available.

use crate::collector;
use crate::config::SandboxConfig;
use crate::container::ContainerExecutor;
use crate::executor::SandboxExecutor;
use crate::host::HostProcessExecutor;
use crate::pipeline;
use crate::workspace::WorkspaceManager;
use judgebox_common::types::{ExecutionRequest, ExecutionStatus, Language, RunOutcome};
use std::time::Duration;
use uuid::Uuid;

const SUM_SOURCE: &str = r#"
public class Main {
    public static void main(String[] args) {
        int a = Integer.parseInt(args[0]);
        int b = Integer.parseInt(args[1]);
        System.out.println(a + b);
    }
}
"#;

const THROW_ON_ONE_SOURCE: &str = r#"
public class Main {
    public static void main(String[] args) {
        int a = Integer.parseInt(args[0]);
        if (a == 1) {
            throw new RuntimeException("deliberate failure");
        }
        System.out.println(a);
    }
}
"#;

const SPIN_ON_ZERO_SOURCE: &str = r#"
public class Main {
    public static void main(String[] args) {
        if (Integer.parseInt(args[0]) == 0) {
            while (true) {}
        }
        System.out.println(args[0]);
    }
}
"#;

fn request(source: &str, inputs: &[&str]) -> ExecutionRequest {
    ExecutionRequest {
        language: Language::Java,
        source_code: source.to_string(),
        inputs: inputs.iter().map(|s| s.to_string()).collect(),
    }
}

fn test_manager() -> WorkspaceManager {
    WorkspaceManager::new(std::env::temp_dir().join(format!("judgebox-test-{}", Uuid::new_v4())))
}

#[tokio::test]
#[ignore] // Requires a JDK
async fn host_sum_program_succeeds_per_case() {
    let workspaces = test_manager();
    let executor = HostProcessExecutor::new(&SandboxConfig::default());

    let response = pipeline::execute(
        &request(SUM_SOURCE, &["4 4", "1 3"]),
        &executor,
        &workspaces,
    )
    .await;

    assert_eq!(response.status, ExecutionStatus::Success);
    assert_eq!(response.outputs, vec!["8", "4"]);
    assert!(response.diagnostic_message.is_none());
    assert_eq!(response.metrics.max_memory_bytes, None);
}

#[tokio::test]
#[ignore] // Requires a JDK
async fn host_runtime_error_short_circuits_at_second_case() {
    let workspaces = test_manager();
    let executor = HostProcessExecutor::new(&SandboxConfig::default());

    let response = pipeline::execute(
        &request(THROW_ON_ONE_SOURCE, &["4", "1", "7"]),
        &executor,
        &workspaces,
    )
    .await;

    assert_eq!(response.status, ExecutionStatus::RuntimeFailure);
    assert_eq!(response.outputs, vec!["4"]);
    assert!(response
        .diagnostic_message
        .unwrap()
        .contains("deliberate failure"));
}

#[tokio::test]
#[ignore] // Requires a JDK
async fn compile_failure_yields_no_outputs_and_no_execution() {
    let workspaces = test_manager();
    let executor = HostProcessExecutor::new(&SandboxConfig::default());

    let response = pipeline::execute(
        &request("public class Main { not java }", &["4 4"]),
        &executor,
        &workspaces,
    )
    .await;

    assert_eq!(response.status, ExecutionStatus::CompileFailure);
    assert!(response.outputs.is_empty());
    assert!(response.diagnostic_message.unwrap().contains("error"));
    assert_eq!(response.metrics.max_time_millis, 0);
}

#[tokio::test]
#[ignore] // Requires a JDK
async fn workspace_is_released_after_the_request() {
    let root = std::env::temp_dir().join(format!("judgebox-test-{}", Uuid::new_v4()));
    let workspaces = WorkspaceManager::new(root.clone());
    let executor = HostProcessExecutor::new(&SandboxConfig::default());

    pipeline::execute(&request(SUM_SOURCE, &["4 4"]), &executor, &workspaces).await;

    let mut entries = tokio::fs::read_dir(&root).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires a Docker daemon with the sandbox image
async fn container_sum_program_reports_memory() {
    let workspaces = test_manager();
    let executor = ContainerExecutor::new(&SandboxConfig::default()).unwrap();

    let response = pipeline::execute(
        &request(SUM_SOURCE, &["4 4", "1 3"]),
        &executor,
        &workspaces,
    )
    .await;

    assert_eq!(response.status, ExecutionStatus::Success);
    assert_eq!(response.outputs, vec!["8", "4"]);
    assert!(response.metrics.max_memory_bytes.is_some());
}

#[tokio::test]
#[ignore] // Requires a Docker daemon with the sandbox image
async fn container_timeout_burns_the_session() {
    let config = SandboxConfig {
        case_timeout: Duration::from_millis(2000),
        ..SandboxConfig::default()
    };
    let workspaces = test_manager();
    let executor = ContainerExecutor::new(&config).unwrap();

    let workspace = workspaces.stage(SPIN_ON_ZERO_SOURCE).await.unwrap();
    assert_eq!(
        crate::compiler::compile(&workspace).await.unwrap(),
        crate::compiler::CompileResult::Success
    );

    let inputs: Vec<String> = ["5", "0", "7"].iter().map(|s| s.to_string()).collect();
    let results = executor.run_all(&workspace, &inputs).await.unwrap();

    // First case ran, second timed out, third was never attempted: the
    // shared container was killed.
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].outcome, RunOutcome::Success);
    assert_eq!(results[1].outcome, RunOutcome::Timeout);

    let response = collector::collect(&results);
    assert_eq!(response.status, ExecutionStatus::RuntimeFailure);
    assert_eq!(response.outputs, vec!["5"]);
    assert!(response
        .diagnostic_message
        .unwrap()
        .contains("time limit exceeded"));

    workspaces.release(&workspace).await;
}
