//! Error types for the GPIO node server

use thiserror::Error;

/// Result type alias for node server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the node server
#[derive(Debug, Error)]
pub enum Error {
    /// Node address does not carry a usable pin number
    #[error("invalid node address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// GPIO pin could not be configured
    #[error("gpio setup failed on pin {pin}: {reason}")]
    GpioSetup { pin: u8, reason: String },

    /// GPIO pin level could not be written
    #[error("gpio write failed on pin {pin}: {reason}")]
    GpioWrite { pin: u8, reason: String },

    /// Host rejected a new node
    #[error("registration of '{address}' failed: {reason}")]
    Registration { address: String, reason: String },

    /// Command name not accepted by the target node
    #[error("node '{address}' does not accept command '{command}'")]
    UnknownCommand { address: String, command: String },

    /// Driver name not declared by the node
    #[error("node '{address}' has no driver '{driver}'")]
    UnknownDriver { address: String, driver: String },

    /// No node registered under the address
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Raspberry Pi GPIO peripheral error
    #[cfg(feature = "rppal")]
    #[error("rppal error: {0}")]
    Gpio(#[from] rppal::gpio::Error),
}
