//! Node types shared by controller and device nodes

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Status driver every node exposes
pub const ST: &str = "ST";

/// ISY unit-of-measure codes used by this node server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Uom {
    /// 0 = false, anything else = true
    Boolean = 2,
}

impl Uom {
    /// Numeric code as sent to the supervisor
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// A named status value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub value: String,
    pub uom: Uom,
}

impl Driver {
    #[must_use]
    pub fn new(value: impl Into<String>, uom: Uom) -> Self {
        Self {
            value: value.into(),
            uom,
        }
    }
}

/// Two-valued output state derived from the `ST` driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    On,
    Off,
}

impl DriverState {
    /// Interpret a boolean driver value; `"0"` and empty are off
    #[must_use]
    pub fn from_value(value: &str) -> Self {
        match value.trim() {
            "" | "0" => Self::Off,
            _ => Self::On,
        }
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// A driver value published to the supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverReport {
    pub address: String,
    pub driver: String,
    pub value: String,
    pub uom: Uom,
}

/// Sending half of the driver report channel
///
/// Nodes publish through this; the node server drains the other end.
#[derive(Debug, Clone)]
pub struct DriverReporter {
    tx: mpsc::UnboundedSender<DriverReport>,
}

impl DriverReporter {
    /// Create a reporter and the receiver that drains it
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DriverReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publish a report; dropped with a warning once the server is gone
    pub fn send(&self, report: DriverReport) {
        if let Err(e) = self.tx.send(report) {
            tracing::warn!(address = %e.0.address, driver = %e.0.driver, "driver report dropped, receiver closed");
        }
    }
}

/// A command delivered to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    /// Wire name, e.g. `DON`
    pub command: String,
    /// Optional parameter, e.g. the on-level for `DON`
    #[serde(default)]
    pub value: Option<String>,
}

impl CommandMessage {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            value: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// The parameter, treating an empty string as absent
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_state_from_value() {
        assert_eq!(DriverState::from_value("0"), DriverState::Off);
        assert_eq!(DriverState::from_value(""), DriverState::Off);
        assert_eq!(DriverState::from_value("1"), DriverState::On);
        assert_eq!(DriverState::from_value("100"), DriverState::On);
    }

    #[test]
    fn empty_value_is_absent() {
        assert_eq!(CommandMessage::new("DON").value(), None);
        assert_eq!(CommandMessage::new("DON").with_value(" ").value(), None);
        assert_eq!(CommandMessage::new("DON").with_value("100").value(), Some("100"));
    }

    #[test]
    fn boolean_uom_code() {
        assert_eq!(Uom::Boolean.code(), 2);
    }

    #[tokio::test]
    async fn reporter_delivers_in_order() {
        let (reporter, mut rx) = DriverReporter::channel();
        for value in ["0", "1"] {
            reporter.send(DriverReport {
                address: "gpio_29".to_string(),
                driver: ST.to_string(),
                value: value.to_string(),
                uom: Uom::Boolean,
            });
        }

        assert_eq!(rx.recv().await.unwrap().value, "0");
        assert_eq!(rx.recv().await.unwrap().value, "1");
    }
}
