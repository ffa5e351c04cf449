//! Local filesystem pane
//!
//! Listing for the local side of the manager. Remote listing lives with the
//! SFTP session; both produce the same [`FileEntry`] shape.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A file or directory entry shown in one of the panes.
///
/// `size` is absent for directories and unreadable entries. `locked` marks
/// entries whose metadata could not be read; the name may still be known.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub locked: bool,
}

/// List a local directory.
///
/// Per-entry metadata failures (permission denied, dangling symlinks) do not
/// abort the listing: the entry is emitted with `locked = true` and no size.
/// When the directory itself cannot be read due to permissions, the listing
/// degrades to a single locked entry for the directory. Entry order is
/// whatever the filesystem yields.
pub fn list_dir(path: &str) -> std::io::Result<Vec<FileEntry>> {
    let dir = Path::new(path);
    let read_dir = match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            warn!("Access denied listing {}", path);
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string());
            return Ok(vec![FileEntry {
                name,
                path: path.to_string(),
                is_dir: true,
                size: None,
                locked: true,
            }]);
        }
        Err(e) => return Err(e),
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let full_path = entry.path();

        // std::fs::metadata follows symlinks, so the panes show what an open
        // would actually hit.
        match std::fs::metadata(&full_path) {
            Ok(metadata) => {
                let is_dir = metadata.is_dir();
                entries.push(FileEntry {
                    name,
                    path: full_path.to_string_lossy().to_string(),
                    is_dir,
                    size: if is_dir { None } else { Some(metadata.len()) },
                    locked: false,
                });
            }
            Err(e) => {
                // Name is visible but details are not; usually a directory we
                // cannot enter.
                warn!("Unreadable entry {}: {}", full_path.display(), e);
                entries.push(FileEntry {
                    name,
                    path: full_path.to_string_lossy().to_string(),
                    is_dir: true,
                    size: None,
                    locked: true,
                });
            }
        }
    }

    Ok(entries)
}
