/// Host-Process Execution Backend
///
/// **Isolation Model:**
/// Runs the compiled artifact as a child JVM with a capped heap
/// (`-Xmx`), one process per test case. The wall-clock deadline is
/// enforced by a bounded wait layered over the blocking OS wait; on
/// expiry the process is forcibly killed.
///
/// **Single-Slot Guarantee:**
/// A one-permit slot serializes case execution, so exactly one child
/// process is ever "the one being killed" when a deadline fires.
///
/// Memory usage is not observable on this backend and is always
/// reported as absent.
use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::executor::{split_input, SandboxExecutor};
use crate::workspace::Workspace;
use async_trait::async_trait;
use judgebox_common::types::{RunOutcome, RunResult};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct HostProcessExecutor {
    case_timeout: Duration,
    heap_limit_mb: u64,
    /// Single-slot execution queue: at most one child process at a time.
    slot: Semaphore,
}

impl HostProcessExecutor {
    pub fn new(config: &SandboxConfig) -> Self {
        Self {
            case_timeout: config.case_timeout,
            heap_limit_mb: config.host_heap_limit_mb,
            slot: Semaphore::new(1),
        }
    }

    async fn run_case(&self, workspace: &Workspace, input: &str) -> Result<RunResult, SandboxError> {
        let start = Instant::now();

        let mut child = Command::new("java")
            .arg(format!("-Xmx{}m", self.heap_limit_mb))
            .arg("-Dfile.encoding=UTF-8")
            .arg("-cp")
            .arg(workspace.dir())
            .arg("Main")
            .args(split_input(input))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Drain both pipes concurrently with the wait so a chatty child
        // cannot deadlock on a full pipe buffer.
        let stdout_task = drain(child.stdout.take());
        let stderr_task = drain(child.stderr.take());

        match tokio::time::timeout(self.case_timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let elapsed_millis = start.elapsed().as_millis() as u64;
                let stdout = stdout_task.await.unwrap_or_default();
                let mut stderr = stderr_task.await.unwrap_or_default();

                let outcome = if !stderr.trim().is_empty() {
                    RunOutcome::RuntimeError
                } else if !status.success() {
                    stderr = format!(
                        "process exited with status {}",
                        status.code().unwrap_or(-1)
                    );
                    RunOutcome::RuntimeError
                } else {
                    RunOutcome::Success
                };

                debug!(elapsed_millis, ?outcome, "Host case finished");
                Ok(RunResult {
                    stdout,
                    stderr,
                    elapsed_millis,
                    peak_memory_bytes: None,
                    outcome,
                })
            }
            Ok(Err(e)) => Err(SandboxError::Io(e)),
            Err(_) => {
                // Deadline expired: forced termination, not cooperative.
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill timed-out process");
                }
                let elapsed_millis = start.elapsed().as_millis() as u64;
                // If the kill failed the pipe may stay open, so the drain
                // gets its own deadline rather than a bare await.
                let stdout = drain_within(stdout_task, DRAIN_GRACE).await;
                stderr_task.abort();

                warn!(
                    elapsed_millis,
                    timeout_ms = self.case_timeout.as_millis() as u64,
                    "Host case timed out, process killed"
                );
                Ok(RunResult {
                    stdout,
                    stderr: format!(
                        "time limit exceeded after {} ms",
                        self.case_timeout.as_millis()
                    ),
                    elapsed_millis,
                    peak_memory_bytes: None,
                    outcome: RunOutcome::Timeout,
                })
            }
        }
    }
}

#[async_trait]
impl SandboxExecutor for HostProcessExecutor {
    async fn run_all(
        &self,
        workspace: &Workspace,
        inputs: &[String],
    ) -> Result<Vec<RunResult>, SandboxError> {
        let mut results = Vec::with_capacity(inputs.len());

        // The executor attempts every input sequentially; stopping at the
        // first error is the collector's decision, not this one's.
        for input in inputs {
            let _permit = self
                .slot
                .acquire()
                .await
                .map_err(|_| SandboxError::Infra("execution slot closed".to_string()))?;
            results.push(self.run_case(workspace, input).await?);
        }

        Ok(results)
    }
}

/// How long a post-kill drain may wait for the pipe to close.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

fn drain<R>(reader: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(mut reader) = reader {
            let _ = reader.read_to_string(&mut buf).await;
        }
        buf
    })
}

/// Wait for a drain task with a deadline. A pipe that never closes
/// forfeits its output: the task is aborted and an empty capture is
/// returned instead of blocking the caller.
async fn drain_within(task: JoinHandle<String>, grace: Duration) -> String {
    let abort = task.abort_handle();
    match tokio::time::timeout(grace, task).await {
        Ok(captured) => captured.unwrap_or_default(),
        Err(_) => {
            warn!("Pipe drain did not finish in time, discarding output");
            abort.abort();
            String::new()
        }
    }
}
