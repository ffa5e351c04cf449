//! Request surface for the two panes
//!
//! [`FileManager`] wires the local lister, the remote session, the transfer
//! engine and the progress registry together. The embedding host marshals its
//! form fields into these calls and nothing more.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::files::{self, FileEntry};
use crate::sftp::{
    collision, ProgressRegistry, RemoteFs, SftpError, TransferEngine, TransferSnapshot,
};

/// Which pane a listing request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneSide {
    Local,
    Remote,
}

/// Facade over one connected device.
pub struct FileManager {
    remote: Arc<dyn RemoteFs>,
    registry: Arc<ProgressRegistry>,
    engine: TransferEngine,
    allow_recursive_delete: bool,
}

impl FileManager {
    /// Wire up a manager for an established remote session.
    ///
    /// `allow_recursive_delete` comes from the device configuration; it is the
    /// only policy the manager holds.
    pub fn new(remote: Arc<dyn RemoteFs>, allow_recursive_delete: bool) -> Self {
        let registry = Arc::new(ProgressRegistry::new());
        let engine = TransferEngine::new(remote.clone(), registry.clone());
        Self {
            remote,
            registry,
            engine,
            allow_recursive_delete,
        }
    }

    pub fn registry(&self) -> &Arc<ProgressRegistry> {
        &self.registry
    }

    /// List a directory on either side.
    pub async fn list_directory(
        &self,
        side: PaneSide,
        path: &str,
    ) -> Result<Vec<FileEntry>, SftpError> {
        match side {
            PaneSide::Local => Ok(files::list_dir(path)?),
            PaneSide::Remote => self.remote.read_dir(path).await,
        }
    }

    /// Start an upload and return its transfer identifier.
    ///
    /// File destinations are collision-resolved here, before the engine sees
    /// them. Directory sources become tree batches, which mirror the source
    /// and overwrite path-equal files.
    pub async fn start_upload(
        &self,
        local_path: &str,
        remote_path: &str,
    ) -> Result<Uuid, SftpError> {
        let metadata = tokio::fs::metadata(local_path).await?;
        if metadata.is_dir() {
            Ok(self.engine.start_upload_tree(local_path, remote_path))
        } else {
            let destination = collision::resolve_remote(self.remote.as_ref(), remote_path).await?;
            Ok(self.engine.start_upload(local_path, &destination))
        }
    }

    /// Start a download and return its transfer identifier.
    pub async fn start_download(
        &self,
        remote_path: &str,
        local_path: &str,
    ) -> Result<Uuid, SftpError> {
        let stat = self.remote.stat(remote_path).await?;
        if stat.is_dir {
            Ok(self.engine.start_download_tree(remote_path, local_path))
        } else {
            let destination = collision::resolve_local(local_path).await?;
            Ok(self.engine.start_download(remote_path, &destination))
        }
    }

    /// Latest snapshot for one transfer; unknown identifiers yield the
    /// sentinel snapshot.
    pub fn poll_progress(&self, id: Uuid) -> TransferSnapshot {
        self.registry.snapshot(id)
    }

    /// Per-file snapshots of a directory transfer.
    pub fn batch_progress(&self, batch: Uuid) -> Vec<TransferSnapshot> {
        self.registry.batch_snapshots(batch)
    }

    /// Delete a remote file or directory.
    ///
    /// Directories are removed recursively only when the device configuration
    /// allows it; otherwise a non-empty directory fails with
    /// [`SftpError::DirectoryNotEmpty`].
    pub async fn delete(&self, path: &str) -> Result<(), SftpError> {
        let stat = self.remote.stat(path).await?;
        if stat.is_dir {
            self.engine
                .delete_tree(path, self.allow_recursive_delete)
                .await
        } else {
            info!("Deleting remote file {}", path);
            self.remote.remove_file(path).await
        }
    }

    /// Wait for every in-flight transfer task to finish or abort.
    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
    }
}
