//! Controller node
//!
//! The controller is the first node the server creates. Its `ST` driver shows
//! the node server is up, and its commands let the supervisor create the
//! relay nodes from the catalog.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::base::NodeBase;
use super::catalog::DeviceDescriptor;
use super::commands::ControllerCommand;
use super::device::{DeviceNode, NodeContext};
use super::types::{CommandMessage, Driver, ST, Uom};
use crate::host::HostInterface;
use crate::{Error, Result};

/// Nodedef id of the controller
pub const NODE_DEF_ID: &str = "CONTROLLER";

/// Outcome of one catalog pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogReport {
    /// Addresses registered by this pass
    pub created: Vec<String>,
    /// Addresses that were already registered
    pub skipped: Vec<String>,
    /// Addresses that could not be created, with the reason
    pub failed: Vec<(String, String)>,
}

/// The node server's primary node
pub struct ControllerNode {
    base: NodeBase,
    catalog: Arc<[DeviceDescriptor]>,
    host: Arc<dyn HostInterface>,
    context: NodeContext,
    /// Held for the whole of every command
    busy: Mutex<()>,
}

impl std::fmt::Debug for ControllerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerNode")
            .field("address", &self.base.address())
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl ControllerNode {
    /// Create the controller; it is its own primary
    #[must_use]
    pub fn new(
        host: Arc<dyn HostInterface>,
        context: NodeContext,
        catalog: impl Into<Arc<[DeviceDescriptor]>>,
        address: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let address = address.into();
        let base = NodeBase::new(
            NODE_DEF_ID,
            address.clone(),
            address,
            name,
            [(ST, Driver::new("1", Uom::Boolean))],
            context.reporter.clone(),
        );

        Self {
            base,
            catalog: catalog.into(),
            host,
            context,
            busy: Mutex::new(()),
        }
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
    pub fn catalog(&self) -> &[DeviceDescriptor] {
        &self.catalog
    }

    /// Commands this node accepts
    #[must_use]
    pub const fn commands() -> &'static [ControllerCommand] {
        &ControllerCommand::ALL
    }

    /// Create every catalog node that is not registered yet (`CREATE_NEW`)
    ///
    /// Entries are handled in catalog order. A failing entry is logged and
    /// skipped; it is retried on the next pass. Passes never overlap.
    pub async fn create_catalog(&self) -> CatalogReport {
        let _busy = self.busy.lock().await;
        self.catalog_pass().await
    }

    async fn catalog_pass(&self) -> CatalogReport {
        let existing = self.host.get_nodes().await;
        let mut report = CatalogReport::default();

        for device in self.catalog.iter() {
            let address = device.address();
            if existing.contains_key(&address) {
                tracing::debug!(%address, "node already exists");
                report.skipped.push(address);
                continue;
            }

            match self.create_device(device, &address).await {
                Ok(result) => {
                    tracing::info!(%address, result = %result, "add node worked");
                    report.created.push(address);
                }
                Err(e) => {
                    tracing::error!(%address, error = %e, "add node failed");
                    report.failed.push((address, e.to_string()));
                }
            }
        }

        tracing::info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "catalog pass complete"
        );
        report
    }

    async fn create_device(&self, device: &DeviceDescriptor, address: &str) -> Result<String> {
        let node = DeviceNode::new(&self.context, self.address(), address, device.name.clone())?;

        // A node whose pin could not be configured is still registered so it
        // shows up for the user; its writes will fail until the pin recovers.
        if let Err(e) = node.setup().await {
            tracing::error!(%address, error = %e, "setup of gpio failed");
        }

        self.host.add_node(node).await
    }

    /// Look for devices outside the catalog (`DISCOVER`)
    ///
    /// Everything this server drives is wired to the local header, so there
    /// is nothing to find.
    pub fn discover(&self) {
        tracing::info!(address = %self.address(), "discovering");
    }

    /// Push profile files to the supervisor (`UPDATE_PROFILE`)
    ///
    /// # Errors
    ///
    /// Returns the host's error
    pub async fn update_profile(&self) -> Result<()> {
        self.host.update_profile().await
    }

    /// Clear all notices (`REMOVE_NOTICES`)
    ///
    /// # Errors
    ///
    /// Returns the host's error
    pub async fn remove_notices(&self) -> Result<()> {
        self.host.remove_notices_all().await
    }

    /// Re-report `ST` (`QUERY`)
    pub fn query(&self) {
        self.base.query();
    }

    /// Run a command by wire name, one command at a time
    ///
    /// # Errors
    ///
    /// Returns `UnknownCommand` for names outside the command table, or the
    /// host's error
    pub async fn run_command(&self, message: &CommandMessage) -> Result<()> {
        let command =
            ControllerCommand::from_name(&message.command).ok_or_else(|| Error::UnknownCommand {
                address: self.address().to_string(),
                command: message.command.clone(),
            })?;

        let _busy = self.busy.lock().await;
        match command {
            ControllerCommand::CreateNew => {
                self.catalog_pass().await;
                Ok(())
            }
            ControllerCommand::Discover => {
                self.discover();
                Ok(())
            }
            ControllerCommand::UpdateProfile => self.update_profile().await,
            ControllerCommand::RemoveNotices => self.remove_notices().await,
            ControllerCommand::Query => {
                self.query();
                Ok(())
            }
        }
    }
}
