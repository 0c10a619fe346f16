//! TOML configuration file loading
//!
//! Supports `~/.config/gpio-nodeserver/config.toml` as a persistent config
//! source. All fields are optional; the file is a partial overlay on top of
//! defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;
use crate::gpio::GpioBackend;
use crate::nodes::DeviceDescriptor;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct NodeServerConfigFile {
    /// Controller node identity
    #[serde(default)]
    pub controller: ControllerFileConfig,

    /// GPIO backend and relay polarity
    #[serde(default)]
    pub gpio: GpioFileConfig,

    /// Device node behavior
    #[serde(default)]
    pub nodes: NodesFileConfig,

    /// Relay catalog; replaces the built-in one when present
    #[serde(default)]
    pub devices: Option<Vec<DeviceDescriptor>>,
}

/// Controller node configuration
#[derive(Debug, Default, Deserialize)]
pub struct ControllerFileConfig {
    /// Node address (e.g. "controller")
    pub address: Option<String>,

    /// Display name
    pub name: Option<String>,
}

/// GPIO configuration
#[derive(Debug, Default, Deserialize)]
pub struct GpioFileConfig {
    /// "simulated" or "rppal"
    pub backend: Option<GpioBackend>,

    /// Relays energize on a low pin
    pub active_low: Option<bool>,
}

/// Device node configuration
#[derive(Debug, Default, Deserialize)]
pub struct NodesFileConfig {
    /// `ST` value for `DON` without a level (e.g. "1" or "100")
    pub on_value: Option<String>,

    /// Create catalog nodes at startup
    pub auto_create: Option<bool>,

    /// Maximum number of device nodes the host accepts
    pub max_nodes: Option<usize>,
}

/// Load the TOML config file from the standard path
///
/// Returns `NodeServerConfigFile::default()` if the file doesn't exist or
/// can't be parsed.
pub fn load_config_file() -> NodeServerConfigFile {
    let Some(path) = config_file_path() else {
        return NodeServerConfigFile::default();
    };

    if !path.exists() {
        return NodeServerConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            NodeServerConfigFile::default()
        }
    }
}

/// Read and parse a config file
///
/// # Errors
///
/// Returns error if the file can't be read or isn't valid TOML
pub fn read_config_file(path: &Path) -> Result<NodeServerConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/gpio-nodeserver/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("gpio-nodeserver").join("config.toml"))
}
