//! GPIO collaborator used by device nodes
//!
//! Nodes never touch a global driver handle. The process bootstrap picks a
//! backend, wraps it in an `Arc<dyn GpioDriver>` and hands it to every node.

pub mod header;
mod simulated;
#[cfg(feature = "rppal")]
mod raspi;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;

pub use header::{HEADER_PINS, bcm_for_header_pin};
#[cfg(feature = "rppal")]
pub use raspi::RppalGpio;
pub use simulated::{SimulatedGpio, WriteRecord};

use crate::{Error, Result};

/// Logic level of a digital pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// The opposite level
    #[must_use]
    pub const fn inverted(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::High => f.write_str("high"),
        }
    }
}

/// Pin direction requested at setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Input, no drive
    Input,
    /// Output with whatever level the hardware already holds
    Output,
    /// Output initialised low
    OutputLow,
    /// Output initialised high
    OutputHigh,
}

impl Direction {
    /// Output direction that starts at `level`
    #[must_use]
    pub const fn output_at(level: Level) -> Self {
        match level {
            Level::Low => Self::OutputLow,
            Level::High => Self::OutputHigh,
        }
    }

    /// Whether the pin may be written after this setup
    #[must_use]
    pub const fn is_output(self) -> bool {
        !matches!(self, Self::Input)
    }
}

/// Low-level access to output pins
///
/// Pin numbers are physical header numbers. Implementations map them to
/// whatever numbering their hardware layer uses.
#[async_trait]
pub trait GpioDriver: Send + Sync {
    /// Backend name, used in logs
    fn name(&self) -> &'static str;

    /// Whether `pin` is a GPIO-capable pin on this platform
    fn is_valid_pin(&self, pin: u8) -> bool {
        bcm_for_header_pin(pin).is_some()
    }

    /// Configure `pin` with the given direction
    async fn setup(&self, pin: u8, direction: Direction) -> Result<()>;

    /// Drive `pin` to `level`
    async fn write(&self, pin: u8, level: Level) -> Result<()>;
}

/// Which GPIO backend the server drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpioBackend {
    /// In-memory pins, for development machines and tests
    #[default]
    Simulated,
    /// Raspberry Pi peripheral access via rppal
    Rppal,
}

impl GpioBackend {
    /// Build the driver for this backend
    ///
    /// # Errors
    ///
    /// Returns error if the GPIO peripheral cannot be opened, or if the
    /// backend was not compiled in
    pub fn build(self) -> Result<std::sync::Arc<dyn GpioDriver>> {
        match self {
            Self::Simulated => Ok(std::sync::Arc::new(SimulatedGpio::new())),
            #[cfg(feature = "rppal")]
            Self::Rppal => Ok(std::sync::Arc::new(RppalGpio::new()?)),
            #[cfg(not(feature = "rppal"))]
            Self::Rppal => Err(Error::Config(
                "rppal backend requested but the crate was built without the `rppal` feature"
                    .to_string(),
            )),
        }
    }
}

impl FromStr for GpioBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "simulated" | "sim" | "mock" => Ok(Self::Simulated),
            "rppal" | "raspi" | "rpi" => Ok(Self::Rppal),
            other => Err(Error::Config(format!("unknown gpio backend: {other}"))),
        }
    }
}

impl fmt::Display for GpioBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulated => f.write_str("simulated"),
            Self::Rppal => f.write_str("rppal"),
        }
    }
}
