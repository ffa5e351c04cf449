//! Destination collision resolution
//!
//! Probes candidate names without mutating anything. The check is
//! point-in-time only: a concurrent writer can still claim the returned path
//! before the caller uses it.

use std::path::Path;

use super::error::SftpError;
use super::path_utils::split_stem_ext;
use super::remote::RemoteFs;

/// Find a non-colliding variant of `candidate` on the local filesystem.
///
/// Unoccupied candidates come back unchanged; otherwise `stem_1.ext`,
/// `stem_2.ext`, ... are probed until a free name is found.
pub async fn resolve_local(candidate: &str) -> Result<String, SftpError> {
    let path = Path::new(candidate);
    if !tokio::fs::try_exists(path).await? {
        return Ok(candidate.to_string());
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| candidate.to_string());

    let mut counter = 1u32;
    loop {
        let probe = parent.join(numbered(&name, counter));
        if !tokio::fs::try_exists(&probe).await? {
            return Ok(probe.to_string_lossy().to_string());
        }
        counter += 1;
    }
}

/// Same contract against the remote side.
pub async fn resolve_remote(remote: &dyn RemoteFs, candidate: &str) -> Result<String, SftpError> {
    if !remote.exists(candidate).await? {
        return Ok(candidate.to_string());
    }

    let (dir, name) = match candidate.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, candidate),
    };

    let mut counter = 1u32;
    loop {
        let probe_name = numbered(name, counter);
        let probe = match dir {
            Some(dir) => format!("{}/{}", dir, probe_name),
            None => probe_name,
        };
        if !remote.exists(&probe).await? {
            return Ok(probe);
        }
        counter += 1;
    }
}

/// `report.txt` -> `report_3.txt`; extensionless names get a bare suffix.
fn numbered(name: &str, counter: u32) -> String {
    match split_stem_ext(name) {
        (stem, Some(ext)) => format!("{}_{}.{}", stem, counter, ext),
        (stem, None) => format!("{}_{}", stem, counter),
    }
}
