//! SFTP session over a russh channel
//!
//! Wraps the russh-sftp client and implements [`RemoteFs`]. One session is
//! shared behind an `Arc` by all concurrent transfers: the SFTP client
//! multiplexes concurrent requests over the single channel.

use async_trait::async_trait;
use russh_sftp::client::error::Error as SftpErrorInner;
use russh_sftp::client::SftpSession as RusshSftpSession;
use russh_sftp::protocol::OpenFlags;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use super::error::SftpError;
use super::path_utils::join_remote_path;
use super::remote::{RemoteFs, RemoteReader, RemoteWriter};
use super::types::RemoteStat;
use crate::files::FileEntry;

/// SFTP session wrapper
pub struct SftpSession {
    sftp: RusshSftpSession,
}

impl SftpSession {
    /// Open the SFTP subsystem over an established channel stream.
    pub async fn new<S>(stream: S) -> Result<Self, SftpError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let sftp = RusshSftpSession::new(stream)
            .await
            .map_err(|e| SftpError::SubsystemNotAvailable(e.to_string()))?;

        info!("SFTP subsystem opened");

        Ok(Self { sftp })
    }
}

#[async_trait]
impl RemoteFs for SftpSession {
    async fn read_dir(&self, path: &str) -> Result<Vec<FileEntry>, SftpError> {
        debug!("Listing remote directory: {}", path);

        let read_dir = self
            .sftp
            .read_dir(path)
            .await
            .map_err(|e| map_sftp_error(e, path))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let name = entry.file_name();

            if name == "." || name == ".." {
                continue;
            }

            let metadata = entry.metadata();
            let is_dir = metadata.is_dir();

            entries.push(FileEntry {
                path: join_remote_path(path, &name),
                name,
                is_dir,
                size: if is_dir { None } else { metadata.size },
                locked: false,
            });
        }

        debug!("Listed {} entries in {}", entries.len(), path);
        Ok(entries)
    }

    async fn stat(&self, path: &str) -> Result<RemoteStat, SftpError> {
        let metadata = self
            .sftp
            .metadata(path)
            .await
            .map_err(|e| map_sftp_error(e, path))?;

        Ok(RemoteStat {
            size: metadata.size.unwrap_or(0),
            is_dir: metadata.is_dir(),
        })
    }

    async fn mkdir(&self, path: &str) -> Result<(), SftpError> {
        debug!("Creating remote directory: {}", path);

        if let Err(e) = self.sftp.create_dir(path).await {
            // SFTP v3 reports a plain failure for an existing directory; probe
            // so callers can tell "already there" from a real error.
            if let Ok(metadata) = self.sftp.metadata(path).await {
                if metadata.is_dir() {
                    return Err(SftpError::AlreadyExists(path.to_string()));
                }
            }
            return Err(map_sftp_error(e, path));
        }

        Ok(())
    }

    async fn remove_file(&self, path: &str) -> Result<(), SftpError> {
        debug!("Removing remote file: {}", path);
        self.sftp
            .remove_file(path)
            .await
            .map_err(|e| map_sftp_error(e, path))
    }

    async fn remove_dir(&self, path: &str) -> Result<(), SftpError> {
        debug!("Removing remote directory: {}", path);

        if let Err(e) = self.sftp.remove_dir(path).await {
            // Same SFTP v3 ambiguity as mkdir: a failed rmdir on a directory
            // that still has children becomes DirectoryNotEmpty.
            if let Ok(read_dir) = self.sftp.read_dir(path).await {
                let non_empty = read_dir.into_iter().any(|entry| {
                    let name = entry.file_name();
                    name != "." && name != ".."
                });
                if non_empty {
                    return Err(SftpError::DirectoryNotEmpty(path.to_string()));
                }
            }
            return Err(map_sftp_error(e, path));
        }

        Ok(())
    }

    async fn open_read(&self, path: &str) -> Result<RemoteReader, SftpError> {
        let file = self
            .sftp
            .open(path)
            .await
            .map_err(|e| map_sftp_error(e, path))?;
        Ok(Box::new(file))
    }

    async fn open_write(&self, path: &str) -> Result<RemoteWriter, SftpError> {
        let file = self
            .sftp
            .open_with_flags(
                path,
                OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
            )
            .await
            .map_err(|e| map_sftp_error(e, path))?;
        Ok(Box::new(file))
    }
}

/// Map SFTP errors to our error type
fn map_sftp_error(err: SftpErrorInner, path: &str) -> SftpError {
    let err_str = err.to_string();
    if err_str.contains("No such file") || err_str.contains("not found") {
        SftpError::NotFound(path.to_string())
    } else if err_str.contains("Permission denied") {
        SftpError::PermissionDenied(path.to_string())
    } else {
        SftpError::ProtocolError(err_str)
    }
}
