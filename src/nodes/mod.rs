//! Nodes exposed to the home-automation supervisor
//!
//! A controller node owns the relay catalog and creates one GPIO device node
//! per catalog entry. Each node reports its `ST` driver through a shared
//! report channel.

pub mod base;
pub mod catalog;
pub mod commands;
pub mod controller;
pub mod device;
pub mod registry;
pub mod types;

pub use base::NodeBase;
pub use catalog::{ADDRESS_PREFIX, DeviceDescriptor, default_catalog};
pub use commands::{ControllerCommand, DeviceCommand};
pub use controller::{CatalogReport, ControllerNode};
pub use device::{DeviceNode, NodeContext, OutputSettings, pin_from_address};
pub use registry::{NodeHandle, NodeRegistry};
pub use types::{CommandMessage, Driver, DriverReport, DriverReporter, DriverState, ST, Uom};
