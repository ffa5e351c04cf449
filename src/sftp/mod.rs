//! SFTP file management module
//!
//! Remote listing, uploads/downloads with polled progress, and remote delete
//! operations. Transfers run on a supervised task set; progress flows through
//! an explicitly shared [`ProgressRegistry`].

pub mod collision;
pub mod error;
pub mod path_utils;
pub mod progress;
pub mod remote;
pub mod session;
pub mod transfer;
pub mod types;

pub use error::SftpError;
pub use progress::ProgressRegistry;
pub use remote::{RemoteFs, RemoteReader, RemoteWriter};
pub use session::SftpSession;
pub use transfer::TransferEngine;
pub use types::{RemoteStat, TransferDirection, TransferSnapshot, TransferState};
