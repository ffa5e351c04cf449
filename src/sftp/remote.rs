//! The remote-session seam
//!
//! Everything the rest of the crate needs from the remote side, narrow enough
//! for a test double to stand in. [`super::session::SftpSession`] is the
//! production implementation.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use super::error::SftpError;
use super::types::RemoteStat;
use crate::files::FileEntry;

/// Boxed reader for streamed remote file contents.
pub type RemoteReader = Box<dyn AsyncRead + Send + Unpin>;

/// Boxed writer for streamed remote file contents.
pub type RemoteWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Operations against the remote filesystem.
///
/// Implementations must tolerate concurrent calls from parallel transfer
/// tasks sharing one handle.
#[async_trait]
pub trait RemoteFs: Send + Sync {
    /// List a remote directory. Failures propagate whole; there is no
    /// partial-result degradation on the remote side.
    async fn read_dir(&self, path: &str) -> Result<Vec<FileEntry>, SftpError>;

    /// Stat a remote path.
    async fn stat(&self, path: &str) -> Result<RemoteStat, SftpError>;

    /// Existence probe used by the collision resolver.
    async fn exists(&self, path: &str) -> Result<bool, SftpError> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(SftpError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a directory. Creating one that already exists fails with
    /// [`SftpError::AlreadyExists`].
    async fn mkdir(&self, path: &str) -> Result<(), SftpError>;

    /// Remove a file.
    async fn remove_file(&self, path: &str) -> Result<(), SftpError>;

    /// Remove an empty directory; a non-empty one fails with
    /// [`SftpError::DirectoryNotEmpty`].
    async fn remove_dir(&self, path: &str) -> Result<(), SftpError>;

    /// Open a remote file for reading.
    async fn open_read(&self, path: &str) -> Result<RemoteReader, SftpError>;

    /// Open a remote file for writing, creating or truncating it.
    async fn open_write(&self, path: &str) -> Result<RemoteWriter, SftpError>;
}
