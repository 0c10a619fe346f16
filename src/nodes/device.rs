//! GPIO-backed relay node

use std::sync::Arc;

use super::base::NodeBase;
use super::commands::DeviceCommand;
use super::types::{CommandMessage, Driver, DriverReporter, DriverState, ST, Uom};
use crate::gpio::{Direction, GpioDriver, Level};
use crate::{Error, Result};

/// Nodedef id of GPIO relay nodes
pub const NODE_DEF_ID: &str = "RASPI_GPIO";

/// How device nodes drive their pins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    /// `ST` value stored by `DON` without an explicit level
    pub on_value: String,
    /// Relay energizes when the pin is pulled low
    pub active_low: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            on_value: "1".to_string(),
            active_low: true,
        }
    }
}

impl OutputSettings {
    /// Pin level that energizes the relay
    #[must_use]
    pub const fn energized(&self) -> Level {
        if self.active_low { Level::Low } else { Level::High }
    }

    /// Pin level that releases the relay
    #[must_use]
    pub const fn de_energized(&self) -> Level {
        self.energized().inverted()
    }
}

/// Collaborators handed to every device node
#[derive(Clone)]
pub struct NodeContext {
    pub gpio: Arc<dyn GpioDriver>,
    pub reporter: DriverReporter,
    pub output: OutputSettings,
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("gpio", &self.gpio.name())
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// Parse the pin from the trailing `_` segment of an address
///
/// # Errors
///
/// Returns `InvalidAddress` if there is no numeric trailing segment
pub fn pin_from_address(address: &str) -> Result<u8> {
    let invalid = |reason: &str| Error::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let (_, segment) = address
        .rsplit_once('_')
        .ok_or_else(|| invalid("expected <prefix>_<pin>"))?;

    segment
        .parse::<u8>()
        .map_err(|_| invalid("trailing segment is not a pin number"))
}

/// One relay channel driven by one output pin
pub struct DeviceNode {
    base: NodeBase,
    pin: u8,
    gpio: Arc<dyn GpioDriver>,
    output: OutputSettings,
}

impl std::fmt::Debug for DeviceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceNode")
            .field("address", &self.base.address())
            .field("pin", &self.pin)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl DeviceNode {
    /// Build a node for `address`, starting in the off state
    ///
    /// # Errors
    ///
    /// Returns `InvalidAddress` if the address has no pin segment or the pin
    /// is not a GPIO pin on this platform
    pub fn new(
        context: &NodeContext,
        primary: impl Into<String>,
        address: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let address = address.into();
        let pin = pin_from_address(&address)?;
        if !context.gpio.is_valid_pin(pin) {
            return Err(Error::InvalidAddress {
                address,
                reason: format!("pin {pin} is not a gpio pin on {}", context.gpio.name()),
            });
        }

        let base = NodeBase::new(
            NODE_DEF_ID,
            primary,
            address,
            name,
            [(ST, Driver::new("0", Uom::Boolean))],
            context.reporter.clone(),
        );

        Ok(Self {
            base,
            pin,
            gpio: Arc::clone(&context.gpio),
            output: context.output.clone(),
        })
    }

    #[must_use]
    pub const fn base(&self) -> &NodeBase {
        &self.base
    }

    #[must_use]
    pub fn address(&self) -> &str {
        self.base.address()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.base.name()
    }

    #[must_use]
    pub const fn pin(&self) -> u8 {
        self.pin
    }

    /// Commands this node accepts
    #[must_use]
    pub const fn commands() -> &'static [DeviceCommand] {
        &DeviceCommand::ALL
    }

    /// Current `ST` value
    #[must_use]
    pub fn st(&self) -> &str {
        self.base.get_driver(ST).map_or("0", |d| d.value.as_str())
    }

    #[must_use]
    pub fn state(&self) -> DriverState {
        DriverState::from_value(self.st())
    }

    /// Configure the pin as an output holding the relay released
    ///
    /// # Errors
    ///
    /// Returns `GpioSetup` if the driver refuses the pin
    pub async fn setup(&self) -> Result<()> {
        let direction = Direction::output_at(self.output.de_energized());
        self.gpio.setup(self.pin, direction).await?;
        tracing::info!(address = %self.address(), pin = self.pin, "gpio setup complete");
        Ok(())
    }

    /// Energize the relay (`DON`)
    ///
    /// `value` is stored as the new `ST`. Without one, or with a value that
    /// reads as off, the configured on-value is used. On a failed write `ST`
    /// keeps its previous value.
    ///
    /// # Errors
    ///
    /// Returns `GpioWrite` if the pin could not be driven
    pub async fn activate(&mut self, value: Option<&str>) -> Result<()> {
        tracing::info!(address = %self.address(), value = value.unwrap_or("No value"), "DON");

        self.gpio.write(self.pin, self.output.energized()).await?;
        tracing::info!(address = %self.address(), "gpio write ON complete");

        let value = match value {
            Some(v) if DriverState::from_value(v) == DriverState::On => v.to_string(),
            _ => self.output.on_value.clone(),
        };
        self.base.set_driver(ST, value, true, false, None)?;
        Ok(())
    }

    /// Release the relay (`DOF`)
    ///
    /// # Errors
    ///
    /// Returns `GpioWrite` if the pin could not be driven
    pub async fn deactivate(&mut self) -> Result<()> {
        tracing::info!(address = %self.address(), "DOF");

        self.gpio.write(self.pin, self.output.de_energized()).await?;
        tracing::info!(address = %self.address(), "gpio write OFF complete");

        self.base.set_driver(ST, "0", true, false, None)?;
        Ok(())
    }

    /// Re-report `ST` from memory (`QUERY`)
    pub fn query(&self) {
        self.base.query();
    }

    /// Run a command by wire name
    ///
    /// # Errors
    ///
    /// Returns `UnknownCommand` for names outside the command table, or the
    /// handler's error
    pub async fn run_command(&mut self, message: &CommandMessage) -> Result<()> {
        let command =
            DeviceCommand::from_name(&message.command).ok_or_else(|| Error::UnknownCommand {
                address: self.address().to_string(),
                command: message.command.clone(),
            })?;

        match command {
            DeviceCommand::On => self.activate(message.value()).await,
            DeviceCommand::Off => self.deactivate().await,
            DeviceCommand::Query => {
                self.query();
                Ok(())
            }
        }
    }
}
