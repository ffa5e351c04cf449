//! Test support: a `RemoteFs` backed by a plain local directory.
//!
//! Remote paths are interpreted relative to the root directory, using `/`
//! separators like real SFTP paths.

use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use gangplank::files::FileEntry;
use gangplank::sftp::{RemoteFs, RemoteReader, RemoteStat, RemoteWriter, SftpError};

pub struct DirRemote {
    root: PathBuf,
}

impl DirRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

fn map_io(path: &str) -> impl Fn(std::io::Error) -> SftpError + '_ {
    move |e| match e.kind() {
        std::io::ErrorKind::NotFound => SftpError::NotFound(path.to_string()),
        std::io::ErrorKind::PermissionDenied => SftpError::PermissionDenied(path.to_string()),
        std::io::ErrorKind::AlreadyExists => SftpError::AlreadyExists(path.to_string()),
        _ => SftpError::Io(e),
    }
}

#[async_trait]
impl RemoteFs for DirRemote {
    async fn read_dir(&self, path: &str) -> Result<Vec<FileEntry>, SftpError> {
        let dir = self.resolve(path);
        let mut read_dir = tokio::fs::read_dir(&dir).await.map_err(map_io(path))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(map_io(path))? {
            let name = entry.file_name().to_string_lossy().to_string();
            let metadata = entry.metadata().await.map_err(map_io(path))?;
            let is_dir = metadata.is_dir();
            let entry_path = if path.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", path.trim_end_matches('/'), name)
            };

            entries.push(FileEntry {
                name,
                path: entry_path,
                is_dir,
                size: if is_dir { None } else { Some(metadata.len()) },
                locked: false,
            });
        }

        Ok(entries)
    }

    async fn stat(&self, path: &str) -> Result<RemoteStat, SftpError> {
        let metadata = tokio::fs::metadata(self.resolve(path))
            .await
            .map_err(map_io(path))?;
        Ok(RemoteStat {
            size: metadata.len(),
            is_dir: metadata.is_dir(),
        })
    }

    async fn mkdir(&self, path: &str) -> Result<(), SftpError> {
        tokio::fs::create_dir(self.resolve(path))
            .await
            .map_err(map_io(path))
    }

    async fn remove_file(&self, path: &str) -> Result<(), SftpError> {
        tokio::fs::remove_file(self.resolve(path))
            .await
            .map_err(map_io(path))
    }

    async fn remove_dir(&self, path: &str) -> Result<(), SftpError> {
        let dir = self.resolve(path);
        let mut read_dir = tokio::fs::read_dir(&dir).await.map_err(map_io(path))?;
        if read_dir.next_entry().await.map_err(map_io(path))?.is_some() {
            return Err(SftpError::DirectoryNotEmpty(path.to_string()));
        }
        tokio::fs::remove_dir(&dir).await.map_err(map_io(path))
    }

    async fn open_read(&self, path: &str) -> Result<RemoteReader, SftpError> {
        let file = tokio::fs::File::open(self.resolve(path))
            .await
            .map_err(map_io(path))?;
        Ok(Box::new(file))
    }

    async fn open_write(&self, path: &str) -> Result<RemoteWriter, SftpError> {
        let file = tokio::fs::File::create(self.resolve(path))
            .await
            .map_err(map_io(path))?;
        Ok(Box::new(file))
    }
}

/// A `DirRemote` whose reads cut out after a fixed number of bytes, standing
/// in for a connection dropped mid-transfer.
pub struct FailingReadRemote {
    inner: DirRemote,
    fail_after: u64,
}

impl FailingReadRemote {
    pub fn new(root: impl Into<PathBuf>, fail_after: u64) -> Self {
        Self {
            inner: DirRemote::new(root),
            fail_after,
        }
    }
}

/// Reader that fails every read with `ConnectionReset`.
struct ErrorReader;

impl AsyncRead for ErrorReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Poll::Ready(Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )))
    }
}

#[async_trait]
impl RemoteFs for FailingReadRemote {
    async fn read_dir(&self, path: &str) -> Result<Vec<FileEntry>, SftpError> {
        self.inner.read_dir(path).await
    }

    async fn stat(&self, path: &str) -> Result<RemoteStat, SftpError> {
        self.inner.stat(path).await
    }

    async fn mkdir(&self, path: &str) -> Result<(), SftpError> {
        self.inner.mkdir(path).await
    }

    async fn remove_file(&self, path: &str) -> Result<(), SftpError> {
        self.inner.remove_file(path).await
    }

    async fn remove_dir(&self, path: &str) -> Result<(), SftpError> {
        self.inner.remove_dir(path).await
    }

    async fn open_read(&self, path: &str) -> Result<RemoteReader, SftpError> {
        let file = self.inner.open_read(path).await?;
        Ok(Box::new(file.take(self.fail_after).chain(ErrorReader)))
    }

    async fn open_write(&self, path: &str) -> Result<RemoteWriter, SftpError> {
        self.inner.open_write(path).await
    }
}
