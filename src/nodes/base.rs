//! Plumbing shared by every node: identity, drivers and reporting

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::types::{Driver, DriverReport, DriverReporter, Uom};
use crate::{Error, Result};

/// Identity and driver table of a node
#[derive(Debug)]
pub struct NodeBase {
    node_def_id: &'static str,
    primary: String,
    address: String,
    name: String,
    added_at: DateTime<Utc>,
    drivers: BTreeMap<&'static str, Driver>,
    reporter: DriverReporter,
}

impl NodeBase {
    /// Create a node with the given declared drivers
    #[must_use]
    pub fn new(
        node_def_id: &'static str,
        primary: impl Into<String>,
        address: impl Into<String>,
        name: impl Into<String>,
        drivers: impl IntoIterator<Item = (&'static str, Driver)>,
        reporter: DriverReporter,
    ) -> Self {
        Self {
            node_def_id,
            primary: primary.into(),
            address: address.into(),
            name: name.into(),
            added_at: Utc::now(),
            drivers: drivers.into_iter().collect(),
            reporter,
        }
    }

    /// Nodedef id the supervisor uses to look up this node's profile
    #[must_use]
    pub const fn node_def_id(&self) -> &'static str {
        self.node_def_id
    }

    /// Address of the primary (controller) node
    #[must_use]
    pub fn primary(&self) -> &str {
        &self.primary
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    /// Whether this node is its own primary
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.primary == self.address
    }

    #[must_use]
    pub fn get_driver(&self, driver: &str) -> Option<&Driver> {
        self.drivers.get(driver)
    }

    /// Set a driver value
    ///
    /// Reports it when `report` is set and the value changed, or always when
    /// `force_report` is set. `uom` replaces the declared unit when given.
    /// Returns whether the value changed.
    ///
    /// # Errors
    ///
    /// Returns error if the driver was not declared
    pub fn set_driver(
        &mut self,
        driver: &str,
        value: impl Into<String>,
        report: bool,
        force_report: bool,
        uom: Option<Uom>,
    ) -> Result<bool> {
        let Some(entry) = self.drivers.get_mut(driver) else {
            return Err(Error::UnknownDriver {
                address: self.address.clone(),
                driver: driver.to_string(),
            });
        };

        let value = value.into();
        let changed = entry.value != value || uom.is_some_and(|u| u != entry.uom);
        entry.value = value;
        if let Some(uom) = uom {
            entry.uom = uom;
        }

        if (report && changed) || force_report {
            self.report_driver(driver);
        }

        Ok(changed)
    }

    /// Send the current value of one driver
    pub fn report_driver(&self, driver: &str) {
        let Some(entry) = self.drivers.get(driver) else {
            tracing::warn!(address = %self.address, driver, "report requested for undeclared driver");
            return;
        };

        tracing::debug!(address = %self.address, driver, value = %entry.value, "reporting driver");
        self.reporter.send(DriverReport {
            address: self.address.clone(),
            driver: driver.to_string(),
            value: entry.value.clone(),
            uom: entry.uom,
        });
    }

    /// Send the current value of every driver
    pub fn report_drivers(&self) {
        for driver in self.drivers.keys() {
            self.report_driver(driver);
        }
    }

    /// Answer a query from memory; there is no hardware read-back
    pub fn query(&self) {
        self.report_drivers();
    }

    /// Snapshot of every driver
    #[must_use]
    pub fn status(&self) -> Vec<(&'static str, Driver)> {
        self.drivers
            .iter()
            .map(|(name, driver)| (*name, driver.clone()))
            .collect()
    }
}
