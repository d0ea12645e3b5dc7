/// Compiler Adapter - Toolchain Invocation
///
/// Runs `javac` against the staged source and returns a structured
/// result. A diagnostic from the compiler is an expected user error and
/// short-circuits the pipeline; a failure to spawn the toolchain at all
/// is an infrastructure failure.
///
/// Compilation has no deadline: build commands are fixed by the sandbox,
/// not attacker-controlled.
use crate::error::SandboxError;
use crate::workspace::{Workspace, SOURCE_FILE_NAME};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Outcome of one compilation. `Failure` carries the toolchain's
/// diagnostics verbatim; this is the only place compiler stderr becomes
/// user-facing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileResult {
    Success,
    Failure { diagnostics: String },
}

/// Compile the staged source in place. The artifact (`Main.class`) lands
/// next to the source and stays exclusively owned by the workspace until
/// teardown removes both.
pub async fn compile(workspace: &Workspace) -> Result<CompileResult, SandboxError> {
    let start = Instant::now();

    let output = Command::new("javac")
        .args(["-encoding", "utf-8", SOURCE_FILE_NAME])
        .current_dir(workspace.dir())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    let elapsed_millis = start.elapsed().as_millis() as u64;

    if output.status.success() {
        info!(
            workspace_id = %workspace.id(),
            compile_time_ms = elapsed_millis,
            "Compilation succeeded"
        );
        return Ok(CompileResult::Success);
    }

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    // javac reports on stderr; fall back to stdout just in case.
    let diagnostics = if stderr.trim().is_empty() { stdout } else { stderr };

    warn!(
        workspace_id = %workspace.id(),
        compile_time_ms = elapsed_millis,
        error_preview = diagnostics.lines().next().unwrap_or(""),
        "Compilation failed"
    );
    debug!(diagnostics = %diagnostics, "Compiler diagnostics");

    Ok(CompileResult::Failure { diagnostics })
}
