//! Configuration management for the node server

pub mod file;

use std::collections::HashSet;
use std::path::Path;

use crate::gpio::{GpioBackend, bcm_for_header_pin};
use crate::nodes::{DeviceDescriptor, DriverState, OutputSettings, default_catalog};
use crate::{Error, Result};

/// Longest node address the supervisor accepts
pub const MAX_ADDRESS_LEN: usize = 14;

/// Node server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Controller node identity
    pub controller: ControllerConfig,

    /// GPIO configuration
    pub gpio: GpioConfig,

    /// Device node configuration
    pub nodes: NodesConfig,

    /// Relay catalog
    pub devices: Vec<DeviceDescriptor>,
}

/// Controller node identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub address: String,
    pub name: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            address: "controller".to_string(),
            name: "GPIO Controller".to_string(),
        }
    }
}

/// GPIO configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpioConfig {
    /// Which driver to use
    pub backend: GpioBackend,

    /// Relays energize on a low pin
    pub active_low: bool,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            backend: GpioBackend::default(),
            active_low: true,
        }
    }
}

/// Device node configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodesConfig {
    /// `ST` value stored by `DON` without a level
    pub on_value: String,

    /// Create catalog nodes at startup
    pub auto_create: bool,

    /// Maximum number of device nodes the host accepts
    pub max_nodes: usize,
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            on_value: "1".to_string(),
            auto_create: false,
            max_nodes: 100,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            gpio: GpioConfig::default(),
            nodes: NodesConfig::default(),
            devices: default_catalog(),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl Config {
    /// Load configuration from the standard config file and environment
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load() -> Result<Self> {
        Self::from_file_config(file::load_config_file())
    }

    /// Load configuration from an explicit config file and the environment
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read or parsed, or the resulting
    /// configuration is invalid
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::from_file_config(file::read_config_file(path)?)
    }

    /// Resolve settings with precedence env > toml > default
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn from_file_config(fc: file::NodeServerConfigFile) -> Result<Self> {
        let defaults = Self::default();

        let controller = ControllerConfig {
            address: fc.controller.address.unwrap_or(defaults.controller.address),
            name: fc.controller.name.unwrap_or(defaults.controller.name),
        };

        let backend = match std::env::var("GPIO_NODESERVER_BACKEND") {
            Ok(s) => s.parse::<GpioBackend>()?,
            Err(_) => fc.gpio.backend.unwrap_or(defaults.gpio.backend),
        };
        let gpio = GpioConfig {
            backend,
            active_low: env_flag("GPIO_NODESERVER_ACTIVE_LOW")
                .or(fc.gpio.active_low)
                .unwrap_or(defaults.gpio.active_low),
        };

        let nodes = NodesConfig {
            on_value: std::env::var("GPIO_NODESERVER_ON_VALUE")
                .ok()
                .or(fc.nodes.on_value)
                .unwrap_or(defaults.nodes.on_value),
            auto_create: env_flag("GPIO_NODESERVER_AUTO_CREATE")
                .or(fc.nodes.auto_create)
                .unwrap_or(defaults.nodes.auto_create),
            max_nodes: fc.nodes.max_nodes.unwrap_or(defaults.nodes.max_nodes),
        };

        let config = Self {
            controller,
            gpio,
            nodes,
            devices: fc.devices.unwrap_or(defaults.devices),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check addresses, on-value and catalog
    ///
    /// # Errors
    ///
    /// Returns `Config` describing the first problem found
    pub fn validate(&self) -> Result<()> {
        let address = &self.controller.address;
        if address.is_empty() || address.len() > MAX_ADDRESS_LEN {
            return Err(Error::Config(format!(
                "controller address must be 1-{MAX_ADDRESS_LEN} characters: '{address}'"
            )));
        }

        if self.nodes.on_value.trim().is_empty() {
            return Err(Error::Config("on_value must not be empty".to_string()));
        }
        if DriverState::from_value(&self.nodes.on_value) == DriverState::Off {
            return Err(Error::Config(format!(
                "on_value '{}' reads as off",
                self.nodes.on_value
            )));
        }

        let mut pins = HashSet::new();
        for device in &self.devices {
            if device.name.trim().is_empty() {
                return Err(Error::Config(format!("device on pin {} has no name", device.pin)));
            }
            if bcm_for_header_pin(device.pin).is_none() {
                return Err(Error::Config(format!(
                    "device '{}' uses header pin {}, which is not a gpio pin",
                    device.name, device.pin
                )));
            }
            if !pins.insert(device.pin) {
                return Err(Error::Config(format!(
                    "header pin {} is assigned to more than one device",
                    device.pin
                )));
            }
            if device.address() == *address {
                return Err(Error::Config(format!(
                    "device '{}' collides with the controller address",
                    device.name
                )));
            }
        }

        if self.devices.len() > self.nodes.max_nodes {
            tracing::warn!(
                devices = self.devices.len(),
                max_nodes = self.nodes.max_nodes,
                "catalog is larger than the node limit, some devices will not be created"
            );
        }

        Ok(())
    }

    /// Output settings handed to device nodes
    #[must_use]
    pub fn output_settings(&self) -> OutputSettings {
        OutputSettings {
            on_value: self.nodes.on_value.clone(),
            active_low: self.gpio.active_low,
        }
    }
}
