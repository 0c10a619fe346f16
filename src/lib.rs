//! GPIO node server - relay nodes for a home-automation supervisor
//!
//! This library provides:
//! - A controller node that creates relay nodes from a static catalog
//! - GPIO device nodes mapping `DON`/`DOF`/`QUERY` onto output pins
//! - GPIO backends (simulated, and Raspberry Pi via `rppal`)
//! - An in-process host standing in for the plugin interface
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            Supervisor / command input        │
//! └─────────────────────┬───────────────────────┘
//!                       │ <address> <COMMAND> [value]
//! ┌─────────────────────▼───────────────────────┐
//! │                 NodeServer                   │
//! │   Controller  │  Host registry  │  Reports   │
//! └─────────────────────┬───────────────────────┘
//!                       │ per-node lock
//! ┌─────────────────────▼───────────────────────┐
//! │   Device nodes  →  GpioDriver (sim / rppal)  │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod daemon;
pub mod error;
pub mod gpio;
pub mod host;
pub mod nodes;

pub use config::Config;
pub use daemon::NodeServer;
pub use error::{Error, Result};
pub use gpio::{Direction, GpioBackend, GpioDriver, Level, SimulatedGpio};
pub use host::{HostInterface, LocalHost};
pub use nodes::{
    CatalogReport, CommandMessage, ControllerNode, DeviceDescriptor, DeviceNode, DriverState,
    NodeContext, OutputSettings,
};
