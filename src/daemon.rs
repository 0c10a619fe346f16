//! Node server - the process bootstrap
//!
//! Owns the GPIO driver, the host and the controller, routes commands by
//! node address and drains driver reports.

use std::io::BufRead;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::gpio::GpioDriver;
use crate::host::{HostInterface, LocalHost};
use crate::nodes::{
    CatalogReport, CommandMessage, ControllerNode, DriverReport, DriverReporter, NodeContext,
};
use crate::{Config, Error, Result};

/// Parse one line of the command protocol: `<address> <COMMAND> [value]`
///
/// Returns `None` for blank lines and `#` comments.
///
/// # Errors
///
/// Returns `Config` if the line has no command or too many fields
pub fn parse_command_line(line: &str) -> Result<Option<(String, CommandMessage)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split_whitespace();
    let (Some(address), Some(command)) = (fields.next(), fields.next()) else {
        return Err(Error::Config(format!(
            "expected '<address> <COMMAND> [value]', got '{line}'"
        )));
    };

    let mut message = CommandMessage::new(command.to_uppercase());
    if let Some(value) = fields.next() {
        message = message.with_value(value);
    }
    if fields.next().is_some() {
        return Err(Error::Config(format!("too many fields in '{line}'")));
    }

    Ok(Some((address.to_string(), message)))
}

/// The running node server
pub struct NodeServer {
    config: Config,
    gpio: Arc<dyn GpioDriver>,
    host: Arc<LocalHost>,
    controller: Arc<ControllerNode>,
    reports: Option<mpsc::UnboundedReceiver<DriverReport>>,
}

impl NodeServer {
    /// Create a node server with the GPIO backend named in the config
    ///
    /// # Errors
    ///
    /// Returns error if the GPIO backend cannot be opened
    pub fn new(config: Config) -> Result<Self> {
        let gpio = config.gpio.backend.build()?;
        Ok(Self::with_gpio(config, gpio))
    }

    /// Create a node server driving the given GPIO backend
    #[must_use]
    pub fn with_gpio(config: Config, gpio: Arc<dyn GpioDriver>) -> Self {
        let (reporter, reports) = DriverReporter::channel();
        let host = Arc::new(LocalHost::new(config.nodes.max_nodes));

        let context = NodeContext {
            gpio: Arc::clone(&gpio),
            reporter,
            output: config.output_settings(),
        };

        let controller = Arc::new(ControllerNode::new(
            Arc::clone(&host) as Arc<dyn HostInterface>,
            context,
            config.devices.clone(),
            config.controller.address.clone(),
            config.controller.name.clone(),
        ));

        tracing::info!(
            backend = gpio.name(),
            controller = %config.controller.address,
            devices = config.devices.len(),
            "node server created"
        );

        Self {
            config,
            gpio,
            host,
            controller,
            reports: Some(reports),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn gpio(&self) -> &Arc<dyn GpioDriver> {
        &self.gpio
    }

    #[must_use]
    pub const fn host(&self) -> &Arc<LocalHost> {
        &self.host
    }

    #[must_use]
    pub const fn controller(&self) -> &Arc<ControllerNode> {
        &self.controller
    }

    /// Take the driver report receiver; `run` drains it itself otherwise
    pub fn take_reports(&mut self) -> Option<mpsc::UnboundedReceiver<DriverReport>> {
        self.reports.take()
    }

    /// Create every missing catalog node
    pub async fn create_catalog(&self) -> CatalogReport {
        self.controller.create_catalog().await
    }

    /// Route a command to the node at `address`
    ///
    /// Device commands hold the node's lock until the GPIO write completes,
    /// so a second command to the same node waits for the first.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` for unknown addresses, `UnknownCommand` for
    /// names the node does not accept, or the handler's error
    pub async fn dispatch(&self, address: &str, message: &CommandMessage) -> Result<()> {
        tracing::debug!(address, command = %message.command, "dispatching command");

        let result = if address == self.controller.address() {
            self.controller.run_command(message).await
        } else {
            match self.host.node(address).await {
                Some(node) => {
                    let mut node = node.lock().await;
                    node.run_command(message).await
                }
                None => Err(Error::NodeNotFound(address.to_string())),
            }
        };

        if let Err(e) = &result {
            tracing::error!(address, command = %message.command, error = %e, "command failed");
        }
        result
    }

    /// Report every node's drivers, controller first
    pub async fn query_all(&self) {
        self.controller.query();

        let nodes = self.host.get_nodes().await;
        let queries = nodes.values().map(|node| async move {
            node.lock().await.query();
        });
        futures::future::join_all(queries).await;
    }

    /// Dispatch command lines until the sender side closes
    ///
    /// Failed commands and malformed lines are logged and do not stop the
    /// loop. Returns how many commands succeeded.
    pub async fn serve(&self, mut lines: mpsc::Receiver<String>) -> usize {
        let mut handled = 0;

        while let Some(line) = lines.recv().await {
            match parse_command_line(&line) {
                Ok(Some((address, message))) => {
                    if self.dispatch(&address, &message).await.is_ok() {
                        handled += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "ignoring malformed command line"),
            }
        }

        handled
    }

    /// Run until stdin closes or the process is interrupted
    pub async fn run(mut self) {
        if let Some(reports) = self.reports.take() {
            tokio::spawn(drain_reports(reports));
        }

        tracing::info!(
            address = %self.controller.address(),
            backend = self.gpio.name(),
            "node server running"
        );

        if self.config.nodes.auto_create {
            self.create_catalog().await;
        }
        self.query_all().await;

        tokio::select! {
            handled = self.serve(spawn_stdin_reader()) => {
                tracing::info!(handled, "command input closed");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
            }
        }
    }
}

/// Forward stdin lines from a detached thread, so a pending read never holds
/// up runtime shutdown
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}

/// Publish driver reports until every reporter is dropped
async fn drain_reports(mut reports: mpsc::UnboundedReceiver<DriverReport>) {
    while let Some(report) = reports.recv().await {
        tracing::info!(
            address = %report.address,
            driver = %report.driver,
            value = %report.value,
            uom = report.uom.code(),
            "driver report"
        );
    }
}
