//! Raspberry Pi backend on top of `rppal`

use std::collections::HashMap;

use async_trait::async_trait;
use rppal::gpio::{Gpio, InputPin, OutputPin};
use tokio::sync::Mutex;

use super::{Direction, GpioDriver, Level, bcm_for_header_pin};
use crate::{Error, Result};

/// GPIO driver for the Raspberry Pi header
///
/// Claimed pins stay claimed for the life of the driver and keep their level
/// when it is dropped, so a restart does not flip every relay.
pub struct RppalGpio {
    gpio: Gpio,
    outputs: Mutex<HashMap<u8, OutputPin>>,
    inputs: Mutex<HashMap<u8, InputPin>>,
}

impl RppalGpio {
    /// Open the GPIO peripheral
    ///
    /// # Errors
    ///
    /// Returns error if `/dev/gpiomem` cannot be opened
    pub fn new() -> Result<Self> {
        let gpio = Gpio::new()?;
        tracing::info!("opened raspberry pi gpio peripheral");
        Ok(Self {
            gpio,
            outputs: Mutex::new(HashMap::new()),
            inputs: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl GpioDriver for RppalGpio {
    fn name(&self) -> &'static str {
        "rppal"
    }

    async fn setup(&self, pin: u8, direction: Direction) -> Result<()> {
        let bcm = bcm_for_header_pin(pin).ok_or_else(|| Error::GpioSetup {
            pin,
            reason: "not a gpio header pin".to_string(),
        })?;

        // Re-running setup on a claimed pin releases the old claim first
        let mut outputs = self.outputs.lock().await;
        let mut inputs = self.inputs.lock().await;
        outputs.remove(&pin);
        inputs.remove(&pin);

        let raw = self.gpio.get(bcm).map_err(|e| Error::GpioSetup {
            pin,
            reason: e.to_string(),
        })?;

        match direction {
            Direction::Input => {
                inputs.insert(pin, raw.into_input());
            }
            Direction::Output | Direction::OutputLow | Direction::OutputHigh => {
                let mut output = match direction {
                    Direction::OutputLow => raw.into_output_low(),
                    Direction::OutputHigh => raw.into_output_high(),
                    _ => raw.into_output(),
                };
                output.set_reset_on_drop(false);
                outputs.insert(pin, output);
            }
        }

        tracing::debug!(pin, bcm, ?direction, "gpio pin configured");
        Ok(())
    }

    async fn write(&self, pin: u8, level: Level) -> Result<()> {
        let mut outputs = self.outputs.lock().await;
        let output = outputs.get_mut(&pin).ok_or_else(|| Error::GpioWrite {
            pin,
            reason: "pin has not been set up as an output".to_string(),
        })?;

        match level {
            Level::Low => output.set_low(),
            Level::High => output.set_high(),
        }

        Ok(())
    }
}
