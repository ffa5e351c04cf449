//! Transfer engine
//!
//! Every file transfer runs as its own task on a supervised tracker; the
//! calling side gets an identifier back immediately and polls the shared
//! [`ProgressRegistry`]. Directory transfers walk the tree with an explicit
//! work stack and spawn one transfer per contained file.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::SftpError;
use super::path_utils::join_remote_path;
use super::progress::ProgressRegistry;
use super::remote::RemoteFs;
use super::types::{TransferDirection, CHUNK_SIZE};

/// Drives uploads, downloads and remote deletes for one session.
///
/// Cheap to clone; clones share the remote handle, the registry and the task
/// tracker.
#[derive(Clone)]
pub struct TransferEngine {
    remote: Arc<dyn RemoteFs>,
    registry: Arc<ProgressRegistry>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl TransferEngine {
    pub fn new(remote: Arc<dyn RemoteFs>, registry: Arc<ProgressRegistry>) -> Self {
        Self {
            remote,
            registry,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ProgressRegistry> {
        &self.registry
    }

    /// Upload one file in the background and return its transfer id.
    ///
    /// The destination must already be collision-resolved by the caller;
    /// whatever occupies it gets overwritten.
    pub fn start_upload(&self, local_path: &str, remote_path: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.registry.register(id, None);
        self.spawn_file_task(
            id,
            TransferDirection::Upload,
            local_path.to_string(),
            remote_path.to_string(),
        );
        id
    }

    /// Download one file in the background and return its transfer id.
    pub fn start_download(&self, remote_path: &str, local_path: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.registry.register(id, None);
        self.spawn_file_task(
            id,
            TransferDirection::Download,
            local_path.to_string(),
            remote_path.to_string(),
        );
        id
    }

    /// Mirror a local directory tree onto the remote.
    ///
    /// Returns a batch id; the per-file transfer records can be enumerated
    /// through [`ProgressRegistry::batch_snapshots`]. Files are overwritten by
    /// path equality; directory transfers do not collision-resolve.
    pub fn start_upload_tree(&self, local_root: &str, remote_root: &str) -> Uuid {
        let batch = Uuid::new_v4();
        let engine = self.clone();
        let local_root = local_root.to_string();
        let remote_root = remote_root.to_string();
        self.tracker.spawn(async move {
            if let Err(e) = engine.upload_tree_walk(batch, &local_root, &remote_root).await {
                warn!("Upload tree walk for batch {} aborted: {}", batch, e);
            }
        });
        batch
    }

    /// Mirror a remote directory tree into a local directory.
    pub fn start_download_tree(&self, remote_root: &str, local_root: &str) -> Uuid {
        let batch = Uuid::new_v4();
        let engine = self.clone();
        let remote_root = remote_root.to_string();
        let local_root = local_root.to_string();
        self.tracker.spawn(async move {
            if let Err(e) = engine
                .download_tree_walk(batch, &remote_root, &local_root)
                .await
            {
                warn!("Download tree walk for batch {} aborted: {}", batch, e);
            }
        });
        batch
    }

    /// Delete a remote directory.
    ///
    /// With `recursive` unset only an empty directory can go;
    /// [`SftpError::DirectoryNotEmpty`] surfaces otherwise. The flag is a
    /// plain parameter; policy lives with the caller, not here.
    pub async fn delete_tree(&self, path: &str, recursive: bool) -> Result<(), SftpError> {
        if !recursive {
            return self.remote.remove_dir(path).await;
        }

        info!("Recursively deleting {}", path);

        // Post-order via an explicit stack: a directory comes back up (and is
        // removed) only after everything beneath it has been expanded. Files
        // go during expansion. Not atomic: a mid-walk failure leaves prior
        // deletions in place.
        let mut stack = vec![(path.to_string(), false)];
        while let Some((dir, expanded)) = stack.pop() {
            if expanded {
                self.remote.remove_dir(&dir).await?;
                continue;
            }

            let entries = self.remote.read_dir(&dir).await?;
            stack.push((dir, true));
            for entry in entries {
                if entry.is_dir {
                    stack.push((entry.path, false));
                } else {
                    self.remote.remove_file(&entry.path).await?;
                }
            }
        }

        Ok(())
    }

    /// Cancel in-flight chunk loops and wait for every tracked task.
    ///
    /// Interrupted transfers terminate with an `error` record. There is no
    /// per-transfer abort: once started, a transfer runs to completion,
    /// failure, or engine shutdown.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    fn spawn_file_task(
        &self,
        id: Uuid,
        direction: TransferDirection,
        local_path: String,
        remote_path: String,
    ) {
        let remote = self.remote.clone();
        let registry = self.registry.clone();
        let cancel = self.cancel.clone();

        self.tracker.spawn(async move {
            let result = match direction {
                TransferDirection::Upload => {
                    upload_file(
                        remote.as_ref(),
                        &registry,
                        id,
                        &local_path,
                        &remote_path,
                        &cancel,
                    )
                    .await
                }
                TransferDirection::Download => {
                    download_file(
                        remote.as_ref(),
                        &registry,
                        id,
                        &remote_path,
                        &local_path,
                        &cancel,
                    )
                    .await
                }
            };

            // Failures stay on this file's record; sibling transfers keep
            // running.
            if let Err(e) = result {
                warn!("Transfer {} failed: {}", id, e);
                registry.fail(id, e.to_string());
            }
        });
    }

    async fn upload_tree_walk(
        &self,
        batch: Uuid,
        local_root: &str,
        remote_root: &str,
    ) -> Result<(), SftpError> {
        info!("Uploading directory {} to {}", local_root, remote_root);

        // Explicit work stack; tree depth must not translate into call-stack
        // depth.
        let mut stack = vec![(PathBuf::from(local_root), remote_root.to_string())];
        while let Some((local_dir, remote_dir)) = stack.pop() {
            if self.cancel.is_cancelled() {
                return Err(SftpError::Interrupted);
            }

            match self.remote.mkdir(&remote_dir).await {
                Ok(()) | Err(SftpError::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }

            let mut entries = tokio::fs::read_dir(&local_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();
                let metadata = entry.metadata().await?;
                let remote_path = join_remote_path(&remote_dir, &name);

                if metadata.is_dir() {
                    stack.push((entry.path(), remote_path));
                } else {
                    let id = Uuid::new_v4();
                    self.registry.register(id, Some(batch));
                    self.spawn_file_task(
                        id,
                        TransferDirection::Upload,
                        entry.path().to_string_lossy().to_string(),
                        remote_path,
                    );
                }
            }
        }

        Ok(())
    }

    async fn download_tree_walk(
        &self,
        batch: Uuid,
        remote_root: &str,
        local_root: &str,
    ) -> Result<(), SftpError> {
        info!("Downloading directory {} to {}", remote_root, local_root);

        let mut stack = vec![(remote_root.to_string(), PathBuf::from(local_root))];
        while let Some((remote_dir, local_dir)) = stack.pop() {
            if self.cancel.is_cancelled() {
                return Err(SftpError::Interrupted);
            }

            tokio::fs::create_dir_all(&local_dir).await?;

            // One listing call per directory; a listing failure aborts the
            // rest of the walk but not transfers already in flight.
            let entries = self.remote.read_dir(&remote_dir).await?;
            for entry in entries {
                let local_path = local_dir.join(&entry.name);

                if entry.is_dir {
                    stack.push((entry.path, local_path));
                } else {
                    let id = Uuid::new_v4();
                    self.registry.register(id, Some(batch));
                    self.spawn_file_task(
                        id,
                        TransferDirection::Download,
                        local_path.to_string_lossy().to_string(),
                        entry.path,
                    );
                }
            }
        }

        Ok(())
    }
}

async fn upload_file(
    remote: &dyn RemoteFs,
    registry: &ProgressRegistry,
    id: Uuid,
    local_path: &str,
    remote_path: &str,
    cancel: &CancellationToken,
) -> Result<(), SftpError> {
    debug!("Uploading {} to {}", local_path, remote_path);

    let total = tokio::fs::metadata(local_path).await?.len();
    registry.start(id, total, TransferDirection::Upload);

    let mut source = tokio::fs::File::open(local_path).await?;
    let mut dest = remote.open_write(remote_path).await?;

    let transferred = copy_with_progress(&mut source, &mut dest, registry, id, total, cancel).await?;

    dest.shutdown()
        .await
        .map_err(|e| SftpError::TransferError(format!("remote flush failed: {}", e)))?;

    registry.complete(id);
    info!("Upload complete: {} ({} bytes)", remote_path, transferred);
    Ok(())
}

async fn download_file(
    remote: &dyn RemoteFs,
    registry: &ProgressRegistry,
    id: Uuid,
    remote_path: &str,
    local_path: &str,
    cancel: &CancellationToken,
) -> Result<(), SftpError> {
    debug!("Downloading {} to {}", remote_path, local_path);

    let stat = remote.stat(remote_path).await?;
    registry.start(id, stat.size, TransferDirection::Download);

    let mut source = remote.open_read(remote_path).await?;
    let mut dest = tokio::fs::File::create(local_path).await?;

    let transferred =
        copy_with_progress(&mut source, &mut dest, registry, id, stat.size, cancel).await?;

    dest.flush().await?;

    registry.complete(id);
    info!("Download complete: {} ({} bytes)", remote_path, transferred);
    Ok(())
}

/// Stream `reader` into `writer` in fixed chunks, overwriting the registry
/// record after each chunk so pollers always see the latest counters.
async fn copy_with_progress<R, W>(
    reader: &mut R,
    writer: &mut W,
    registry: &ProgressRegistry,
    id: Uuid,
    total: u64,
    cancel: &CancellationToken,
) -> Result<u64, SftpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut transferred = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Err(SftpError::Interrupted);
        }

        let n = reader
            .read(&mut buffer)
            .await
            .map_err(|e| SftpError::TransferError(format!("read failed: {}", e)))?;
        if n == 0 {
            break;
        }

        writer
            .write_all(&buffer[..n])
            .await
            .map_err(|e| SftpError::TransferError(format!("write failed: {}", e)))?;

        transferred += n as u64;
        registry.update(id, transferred, total);
    }

    Ok(transferred)
}
