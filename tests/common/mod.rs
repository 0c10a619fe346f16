//! Shared test utilities

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use gpio_nodeserver::config::Config;
use gpio_nodeserver::nodes::{DeviceDescriptor, DeviceNode, NodeHandle};
use gpio_nodeserver::{Error, HostInterface, LocalHost, NodeServer, SimulatedGpio};
use tokio::sync::Mutex;

/// Config with the given catalog and defaults everywhere else
#[must_use]
pub fn config_with(devices: Vec<DeviceDescriptor>) -> Config {
    Config {
        devices,
        ..Config::default()
    }
}

/// Node server on a fresh simulated GPIO, returning both
#[must_use]
pub fn server_with(devices: Vec<DeviceDescriptor>) -> (NodeServer, Arc<SimulatedGpio>) {
    let gpio = Arc::new(SimulatedGpio::new());
    let server = NodeServer::with_gpio(config_with(devices), gpio.clone());
    (server, gpio)
}

/// Current `ST` of a registered node
pub async fn st_of(server: &NodeServer, address: &str) -> String {
    let node = server
        .host()
        .node(address)
        .await
        .unwrap_or_else(|| panic!("{address} not registered"));
    let node = node.lock().await;
    node.st().to_string()
}

/// Host that refuses to register selected addresses
pub struct FlakyHost {
    inner: LocalHost,
    refused: Mutex<HashSet<String>>,
}

impl FlakyHost {
    pub fn refusing(addresses: &[&str]) -> Self {
        Self {
            inner: LocalHost::default(),
            refused: Mutex::new(addresses.iter().map(ToString::to_string).collect()),
        }
    }

    pub async fn addresses(&self) -> Vec<String> {
        self.inner.addresses().await
    }

    pub async fn allow_all(&self) {
        self.refused.lock().await.clear();
    }
}

#[async_trait]
impl HostInterface for FlakyHost {
    async fn get_nodes(&self) -> HashMap<String, NodeHandle> {
        self.inner.get_nodes().await
    }

    async fn add_node(&self, node: DeviceNode) -> gpio_nodeserver::Result<String> {
        if self.refused.lock().await.contains(node.address()) {
            return Err(Error::Registration {
                address: node.address().to_string(),
                reason: "supervisor unavailable".to_string(),
            });
        }
        self.inner.add_node(node).await
    }

    async fn update_profile(&self) -> gpio_nodeserver::Result<()> {
        self.inner.update_profile().await
    }

    async fn remove_notices_all(&self) -> gpio_nodeserver::Result<()> {
        self.inner.remove_notices_all().await
    }
}
