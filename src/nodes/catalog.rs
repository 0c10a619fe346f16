//! Static catalog of relay channels wired to the header

use serde::Deserialize;

/// Address prefix for GPIO-backed device nodes
pub const ADDRESS_PREFIX: &str = "gpio_";

/// A relay channel known at build time
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceDescriptor {
    /// Display name
    pub name: String,
    /// Physical header pin
    pub pin: u8,
}

impl DeviceDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, pin: u8) -> Self {
        Self {
            name: name.into(),
            pin,
        }
    }

    /// Node address for this channel, e.g. `gpio_29`
    #[must_use]
    pub fn address(&self) -> String {
        format!("{ADDRESS_PREFIX}{}", self.pin)
    }
}

// CH PIN BCM
// CH1 29  5
// CH2 31  6
// CH3 33 13
// CH4 36 16
// CH5 35 19
// CH6 38 20
// CH7 40 21
// CH8 37 26
const RELAYS: &[(&str, u8)] = &[
    ("Yard Audio", 29),
    ("Path Lights", 37),
    ("Shed Lights", 36),
    ("Bench Lights", 35),
    ("Landscape Lights", 40),
];

/// The relay channels wired on this board
#[must_use]
pub fn default_catalog() -> Vec<DeviceDescriptor> {
    RELAYS
        .iter()
        .map(|(name, pin)| DeviceDescriptor::new(*name, *pin))
        .collect()
}
