//! SSH connection layer
//!
//! Connects and authenticates against the configured device; the SFTP
//! subsystem is opened on top of the authenticated handle.

pub mod client;
pub mod error;

pub use client::{SshClient, SshSession};
pub use error::SshError;
