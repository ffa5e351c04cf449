//! SFTP data types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Upload,
    Download,
}

/// Observable state of a transfer.
///
/// `unknown` is the sentinel for polls against an identifier the registry has
/// never seen; records themselves never carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferState {
    Pending,
    Uploading,
    Downloading,
    Done,
    Error,
    Unknown,
}

impl TransferState {
    /// Terminal states are absorbing: no further record mutation afterwards.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Done | TransferState::Error)
    }
}

/// Point-in-time view of one transfer, returned to pollers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSnapshot {
    pub id: Uuid,
    /// Bytes moved so far
    pub done: u64,
    /// Total bytes, once the source has been stat'ed
    pub total: u64,
    pub state: TransferState,
    /// Failure message when `state` is `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransferSnapshot {
    /// Sentinel snapshot for an identifier the registry does not know.
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            done: 0,
            total: 0,
            state: TransferState::Unknown,
            error: None,
        }
    }

    /// Calculate completion percentage (0-100)
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.done as f64 / self.total as f64) * 100.0
    }
}

/// Stat subset the transfer engine needs from the remote side.
#[derive(Debug, Clone, Copy)]
pub struct RemoteStat {
    pub size: u64,
    pub is_dir: bool,
}

/// Chunk size for streamed transfers (64 KB)
pub const CHUNK_SIZE: usize = 64 * 1024;
