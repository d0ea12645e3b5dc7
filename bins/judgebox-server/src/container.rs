/// Container Execution Backend
///
/// **Isolation Model:**
/// One container per request, provisioned after successful compilation
/// and reused across all of the request's test cases:
/// - workspace bind-mounted read-write at a fixed in-container path
/// - root filesystem mounted read-only
/// - networking disabled
/// - memory and CPU capped
///
/// Each test case is one in-container exec with an attached
/// stdout/stderr stream and a wall-clock deadline. On overrun the whole
/// container is killed, which deliberately aborts the remaining cases
/// of the request (container reuse trade-off; the collector surfaces
/// the timeout).
///
/// A background memory sampler runs for the life of the session and is
/// stopped deterministically at teardown. Teardown always completes:
/// kill/remove failures are logged, never escalated.
use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::executor::{split_input, SandboxExecutor};
use crate::sampler::MemorySampler;
use crate::workspace::Workspace;
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, LogOutput, RemoveContainerOptions,
    StartContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures_util::StreamExt;
use judgebox_common::types::{RunOutcome, RunResult};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Fixed in-container mount point for the workspace.
const MOUNT_POINT: &str = "/app";

pub struct ContainerExecutor {
    docker: Docker,
    image: String,
    memory_bytes: i64,
    nano_cpus: i64,
    case_timeout: Duration,
    poll_interval: Duration,
}

/// One live container bound 1:1 to a workspace, plus its sampler.
/// Destroyed unconditionally before the response is returned.
struct SandboxSession {
    container_id: String,
    sampler: MemorySampler,
}

impl ContainerExecutor {
    pub fn new(config: &SandboxConfig) -> Result<Self, SandboxError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self {
            docker,
            image: config.container_image.clone(),
            memory_bytes: config.container_memory_bytes,
            nano_cpus: config.container_nano_cpus(),
            case_timeout: config.case_timeout,
            poll_interval: config.sampler_poll_interval,
        })
    }

    /// Pull the base image only if it is absent locally. The check runs
    /// fresh per session, so there is no process-wide mutable state and
    /// concurrent requests stay safe.
    async fn ensure_image(&self) -> Result<(), SandboxError> {
        if self.docker.inspect_image(&self.image).await.is_ok() {
            debug!(image = %self.image, "Image cache hit");
            return Ok(());
        }

        warn!(image = %self.image, "Image cache miss, pulling");
        let options = Some(CreateImageOptions {
            from_image: self.image.as_str(),
            ..Default::default()
        });
        let mut stream = self.docker.create_image(options, None, None);
        while let Some(progress) = stream.next().await {
            progress?;
        }

        info!(image = %self.image, "Image pulled");
        Ok(())
    }

    /// Create and start the session container and attach the sampler
    /// before any command is issued.
    async fn provision(&self, workspace: &Workspace) -> Result<SandboxSession, SandboxError> {
        let container_name = format!("judgebox-{}", workspace.id());

        let config = Config {
            image: Some(self.image.clone()),
            // Keep the container alive between execs; each test case runs
            // as its own exec against this one container.
            cmd: Some(vec!["/bin/sh".to_string()]),
            tty: Some(true),
            open_stdin: Some(true),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            network_disabled: Some(true),
            host_config: Some(bollard::models::HostConfig {
                binds: Some(vec![format!(
                    "{}:{}",
                    workspace.dir().display(),
                    MOUNT_POINT
                )]),
                memory: Some(self.memory_bytes),
                nano_cpus: Some(self.nano_cpus),
                readonly_rootfs: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };

        let create_options = CreateContainerOptions {
            name: container_name.as_str(),
            platform: None,
        };

        let container = self
            .docker
            .create_container(Some(create_options), config)
            .await?;
        let container_id = container.id;

        if let Err(e) = self
            .docker
            .start_container(&container_id, None::<StartContainerOptions<String>>)
            .await
        {
            // Created but never started; reclaim it before surfacing.
            self.remove_container(&container_id).await;
            return Err(e.into());
        }

        let sampler = MemorySampler::start(
            self.docker.clone(),
            container_id.clone(),
            self.poll_interval,
        );

        info!(container_id = %container_id, image = %self.image, "Sandbox session provisioned");
        Ok(SandboxSession {
            container_id,
            sampler,
        })
    }

    async fn run_case(
        &self,
        session: &SandboxSession,
        input: &str,
    ) -> Result<RunResult, SandboxError> {
        let mut cmd = vec![
            "java".to_string(),
            "-cp".to_string(),
            MOUNT_POINT.to_string(),
            "Main".to_string(),
        ];
        cmd.extend(split_input(input));

        let exec = self
            .docker
            .create_exec(
                &session.container_id,
                CreateExecOptions {
                    cmd: Some(cmd),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        let start = Instant::now();

        let attach_and_wait = async {
            let mut stdout = String::new();
            let mut stderr = String::new();

            let start_options = StartExecOptions {
                detach: false,
                ..Default::default()
            };
            match self.docker.start_exec(&exec.id, Some(start_options)).await? {
                StartExecResults::Attached { mut output, .. } => {
                    while let Some(chunk) = output.next().await {
                        match chunk? {
                            LogOutput::StdOut { message } => {
                                stdout.push_str(&String::from_utf8_lossy(&message));
                            }
                            LogOutput::StdErr { message } => {
                                stderr.push_str(&String::from_utf8_lossy(&message));
                            }
                            _ => {}
                        }
                    }
                }
                StartExecResults::Detached => {}
            }

            let inspect = self.docker.inspect_exec(&exec.id).await?;
            Ok::<_, SandboxError>((stdout, stderr, inspect.exit_code))
        };

        match tokio::time::timeout(self.case_timeout, attach_and_wait).await {
            Ok(Ok((stdout, mut stderr, exit_code))) => {
                let elapsed_millis = start.elapsed().as_millis() as u64;

                let outcome = if !stderr.trim().is_empty() {
                    RunOutcome::RuntimeError
                } else {
                    match exit_code {
                        Some(code) if code != 0 => {
                            stderr = format!("process exited with status {}", code);
                            RunOutcome::RuntimeError
                        }
                        _ => RunOutcome::Success,
                    }
                };

                debug!(elapsed_millis, ?outcome, "Container case finished");
                Ok(RunResult {
                    stdout,
                    stderr,
                    elapsed_millis,
                    peak_memory_bytes: Some(session.sampler.peak_bytes()),
                    outcome,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                let elapsed_millis = start.elapsed().as_millis() as u64;
                warn!(
                    container_id = %session.container_id,
                    timeout_ms = self.case_timeout.as_millis() as u64,
                    "Case timed out, killing session container"
                );

                // Kill the whole container, not just the exec: there is no
                // per-exec kill in the runtime API, and the session is
                // considered burned from here on.
                if let Err(e) = self
                    .docker
                    .kill_container(
                        &session.container_id,
                        None::<KillContainerOptions<String>>,
                    )
                    .await
                {
                    warn!(error = %e, "Failed to kill timed-out container");
                }

                Ok(RunResult {
                    stdout: String::new(),
                    stderr: format!(
                        "time limit exceeded after {} ms",
                        self.case_timeout.as_millis()
                    ),
                    elapsed_millis,
                    peak_memory_bytes: Some(session.sampler.peak_bytes()),
                    outcome: RunOutcome::Timeout,
                })
            }
        }
    }

    async fn run_cases(
        &self,
        session: &SandboxSession,
        inputs: &[String],
    ) -> Result<Vec<RunResult>, SandboxError> {
        let mut results = Vec::with_capacity(inputs.len());

        for input in inputs {
            let result = self.run_case(session, input).await?;
            let timed_out = result.outcome == RunOutcome::Timeout;
            results.push(result);
            if timed_out {
                // The shared container is gone; remaining cases cannot run.
                warn!(
                    attempted = results.len(),
                    total = inputs.len(),
                    "Timeout burned the session, skipping remaining cases"
                );
                break;
            }
        }

        Ok(results)
    }

    /// Release the session regardless of how the cases went. Kill
    /// tolerates an already-stopped container (the timeout path kills it
    /// first); removal is forced. Neither failure escalates.
    async fn teardown(&self, mut session: SandboxSession) {
        session.sampler.stop().await;

        if let Err(e) = self
            .docker
            .kill_container(
                &session.container_id,
                None::<KillContainerOptions<String>>,
            )
            .await
        {
            debug!(container_id = %session.container_id, error = %e, "Kill at teardown (container may already be stopped)");
        }

        self.remove_container(&session.container_id).await;
        debug!(container_id = %session.container_id, "Sandbox session torn down");
    }

    async fn remove_container(&self, container_id: &str) {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        if let Err(e) = self.docker.remove_container(container_id, Some(options)).await {
            warn!(container_id = %container_id, error = %e, "Failed to remove container");
        }
    }
}

#[async_trait]
impl SandboxExecutor for ContainerExecutor {
    async fn run_all(
        &self,
        workspace: &Workspace,
        inputs: &[String],
    ) -> Result<Vec<RunResult>, SandboxError> {
        self.ensure_image().await?;
        let session = self.provision(workspace).await?;

        let outcome = self.run_cases(&session, inputs).await;
        self.teardown(session).await;
        outcome
    }
}
