mod collector;
mod compiler;
mod config;
mod container;
mod error;
mod executor;
mod handlers;
mod host;
mod pipeline;
mod routes;
mod sampler;
mod workspace;

#[cfg(test)]
mod pipeline_tests;

use crate::config::SandboxConfig;
use crate::executor::SandboxExecutor;
use crate::workspace::WorkspaceManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub struct AppState {
    pub executor: Arc<dyn SandboxExecutor>,
    pub workspaces: WorkspaceManager,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Judgebox server booting...");

    let config = SandboxConfig::from_env();
    info!(
        backend = ?config.backend,
        timeout_ms = config.case_timeout.as_millis() as u64,
        image = %config.container_image,
        staging_root = %config.staging_root.display(),
        "Sandbox configured"
    );

    let executor = executor::build_executor(&config)
        .map_err(|e| anyhow::anyhow!("failed to build execution backend: {}", e))?;
    let workspaces = WorkspaceManager::new(config.staging_root.clone());

    let state = Arc::new(AppState {
        executor,
        workspaces,
    });

    let app = routes::routes().with_state(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("HTTP server listening on {}", config.bind_addr);
    info!("Ready to accept submissions");

    axum::serve(listener, app).await?;
    Ok(())
}
