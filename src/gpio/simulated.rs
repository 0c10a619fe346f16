//! In-memory GPIO backend
//!
//! Mimics a real pin controller closely enough for development hosts and
//! tests: pins must be set up as outputs before they are written, and
//! individual pins can be made to fail.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Direction, GpioDriver, Level};
use crate::{Error, Result};

/// A single completed write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRecord {
    pub pin: u8,
    pub level: Level,
}

#[derive(Debug, Default)]
struct SimState {
    directions: HashMap<u8, Direction>,
    levels: HashMap<u8, Level>,
    writes: Vec<WriteRecord>,
    setups: Vec<u8>,
    failing: HashSet<u8>,
}

/// Simulated pin controller
#[derive(Debug, Default)]
pub struct SimulatedGpio {
    state: Mutex<SimState>,
    latency: Option<Duration>,
    setup_latency: Option<Duration>,
}

impl SimulatedGpio {
    /// Create a controller with every pin unconfigured
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every write by `latency`, like a slow driver round trip
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Delay every setup by `latency`
    #[must_use]
    pub fn with_setup_latency(mut self, latency: Duration) -> Self {
        self.setup_latency = Some(latency);
        self
    }

    /// Make setup and writes on `pin` fail until [`Self::restore_pin`]
    pub async fn fail_pin(&self, pin: u8) {
        self.state.lock().await.failing.insert(pin);
    }

    /// Clear an injected failure
    pub async fn restore_pin(&self, pin: u8) {
        self.state.lock().await.failing.remove(&pin);
    }

    /// Current level of `pin`, if it was ever driven
    pub async fn level(&self, pin: u8) -> Option<Level> {
        self.state.lock().await.levels.get(&pin).copied()
    }

    /// Direction `pin` was set up with
    pub async fn direction(&self, pin: u8) -> Option<Direction> {
        self.state.lock().await.directions.get(&pin).copied()
    }

    /// Every successful write, oldest first
    pub async fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().await.writes.clone()
    }

    /// Pins of every successful setup, oldest first
    pub async fn setups(&self) -> Vec<u8> {
        self.state.lock().await.setups.clone()
    }
}

#[async_trait]
impl GpioDriver for SimulatedGpio {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn setup(&self, pin: u8, direction: Direction) -> Result<()> {
        if !self.is_valid_pin(pin) {
            return Err(Error::GpioSetup {
                pin,
                reason: "not a gpio header pin".to_string(),
            });
        }

        if let Some(latency) = self.setup_latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock().await;
        if state.failing.contains(&pin) {
            return Err(Error::GpioSetup {
                pin,
                reason: "simulated fault".to_string(),
            });
        }

        state.directions.insert(pin, direction);
        state.setups.push(pin);
        match direction {
            Direction::OutputLow => {
                state.levels.insert(pin, Level::Low);
            }
            Direction::OutputHigh => {
                state.levels.insert(pin, Level::High);
            }
            Direction::Input | Direction::Output => {}
        }

        tracing::trace!(pin, ?direction, "simulated pin configured");
        Ok(())
    }

    async fn write(&self, pin: u8, level: Level) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock().await;
        if state.failing.contains(&pin) {
            return Err(Error::GpioWrite {
                pin,
                reason: "simulated fault".to_string(),
            });
        }

        match state.directions.get(&pin) {
            Some(direction) if direction.is_output() => {}
            Some(_) => {
                return Err(Error::GpioWrite {
                    pin,
                    reason: "pin is configured as input".to_string(),
                });
            }
            None => {
                return Err(Error::GpioWrite {
                    pin,
                    reason: "pin has not been set up".to_string(),
                });
            }
        }

        state.levels.insert(pin, level);
        state.writes.push(WriteRecord { pin, level });

        tracing::trace!(pin, %level, "simulated pin written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_requires_output_setup() {
        let gpio = SimulatedGpio::new();

        let err = gpio.write(29, Level::Low).await.unwrap_err();
        assert!(matches!(err, Error::GpioWrite { pin: 29, .. }));

        gpio.setup(29, Direction::Input).await.unwrap();
        assert!(gpio.write(29, Level::Low).await.is_err());

        gpio.setup(29, Direction::OutputHigh).await.unwrap();
        assert_eq!(gpio.level(29).await, Some(Level::High));
        assert_eq!(gpio.setups().await, vec![29, 29]);

        gpio.write(29, Level::Low).await.unwrap();
        assert_eq!(gpio.level(29).await, Some(Level::Low));
        assert_eq!(
            gpio.writes().await,
            vec![WriteRecord {
                pin: 29,
                level: Level::Low
            }]
        );
    }

    #[tokio::test]
    async fn setup_rejects_non_gpio_pins() {
        let gpio = SimulatedGpio::new();
        let err = gpio.setup(6, Direction::Output).await.unwrap_err();
        assert!(matches!(err, Error::GpioSetup { pin: 6, .. }));
    }

    #[tokio::test]
    async fn injected_fault_blocks_writes_until_restored() {
        let gpio = SimulatedGpio::new();
        gpio.setup(37, Direction::OutputHigh).await.unwrap();

        gpio.fail_pin(37).await;
        assert!(gpio.write(37, Level::Low).await.is_err());
        assert_eq!(gpio.level(37).await, Some(Level::High));
        assert!(gpio.writes().await.is_empty());

        gpio.restore_pin(37).await;
        gpio.write(37, Level::Low).await.unwrap();
        assert_eq!(gpio.level(37).await, Some(Level::Low));
    }
}
