/// Workspace Manager - Per-Request Staging Directories
///
/// **Core Responsibility:**
/// Give every request an isolated, uniquely named directory holding its
/// source file, and remove that directory at teardown.
///
/// **Isolation Invariant:**
/// The staging root is the only resource shared across concurrent
/// requests. It is never locked: each request gets a collision-free
/// (uuid v4) subdirectory, so no request can read or write another's
/// files.
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Canonical entry-point file name mandated by the Java toolchain.
pub const SOURCE_FILE_NAME: &str = "Main.java";

/// A staged workspace, exclusively owned by one request.
#[derive(Debug, Clone)]
pub struct Workspace {
    id: Uuid,
    dir: PathBuf,
}

impl Workspace {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Absolute directory path (bind mounts require it).
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Allocates and releases workspaces under a global staging root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a fresh uuid-named directory under the staging root
    /// (created lazily if absent) and write the source into it as
    /// `Main.java`.
    pub async fn stage(&self, source_code: &str) -> io::Result<Workspace> {
        fs::create_dir_all(&self.root).await?;

        let id = Uuid::new_v4();
        let dir = self.root.join(id.to_string());
        fs::create_dir(&dir).await?;
        fs::write(dir.join(SOURCE_FILE_NAME), source_code).await?;

        // Canonicalize so the container backend can bind-mount the path.
        let dir = fs::canonicalize(&dir).await?;

        debug!(workspace_id = %id, dir = %dir.display(), "Workspace staged");
        Ok(Workspace { id, dir })
    }

    /// Recursively remove a workspace. Returns whether removal occurred.
    /// Never propagates errors: cleanup must not mask the primary result,
    /// and releasing an already-absent workspace is not an error.
    pub async fn release(&self, workspace: &Workspace) -> bool {
        match fs::remove_dir_all(workspace.dir()).await {
            Ok(()) => {
                debug!(workspace_id = %workspace.id(), "Workspace released");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(
                    workspace_id = %workspace.id(),
                    dir = %workspace.dir().display(),
                    error = %e,
                    "Failed to release workspace"
                );
                false
            }
        }
    }
}
