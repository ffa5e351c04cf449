//! Device configuration
//!
//! Connection settings for remote devices live in `~/.gangplank/devices.json`.
//! The file holds a list of devices; the engine connects to one device at a
//! time, so the loader hands back the first entry.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("No devices configured")]
    NoDevices,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connection settings for one remote device.
///
/// Either `key_file` or `password` must be present; when both are set the key
/// wins. `allow_recursive_delete` gates recursive remote deletion; the
/// engine itself never reads this file, it receives the flag as a parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub key_file: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub allow_recursive_delete: bool,
}

#[derive(Debug, Deserialize)]
struct DevicesFile {
    connections: Vec<DeviceConfig>,
}

fn default_port() -> u16 {
    22
}

/// Get the gangplank configuration directory (`~/.gangplank`).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".gangplank"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Get the devices file path.
pub fn devices_file() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("devices.json"))
}

/// Load the first configured device from the default location.
pub fn load() -> Result<DeviceConfig, ConfigError> {
    load_from(&devices_file()?)
}

/// Load the first configured device from a specific file.
pub fn load_from(path: &Path) -> Result<DeviceConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let file: DevicesFile = serde_json::from_str(&raw)?;
    file.connections
        .into_iter()
        .next()
        .ok_or(ConfigError::NoDevices)
}
