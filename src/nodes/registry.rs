//! Registry of device nodes keyed by address

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::device::DeviceNode;
use crate::{Error, Result};

/// Shared handle to a registered node
///
/// The mutex is held for the whole of a command, so commands to one node
/// run one at a time while different nodes proceed independently.
pub type NodeHandle = Arc<Mutex<DeviceNode>>;

/// Registry of device nodes
#[derive(Debug)]
pub struct NodeRegistry {
    nodes: HashMap<String, NodeHandle>,
    max_nodes: usize,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl NodeRegistry {
    /// Create an empty registry holding at most `max_nodes` nodes
    #[must_use]
    pub fn new(max_nodes: usize) -> Self {
        Self {
            nodes: HashMap::new(),
            max_nodes,
        }
    }

    /// Register a node under its own address
    ///
    /// # Errors
    ///
    /// Returns `Registration` if the address is taken or the registry is full
    pub fn register(&mut self, node: DeviceNode) -> Result<NodeHandle> {
        let address = node.address().to_string();
        if self.nodes.contains_key(&address) {
            return Err(Error::Registration {
                address,
                reason: "address already registered".to_string(),
            });
        }
        if self.nodes.len() >= self.max_nodes {
            return Err(Error::Registration {
                address,
                reason: format!("node limit of {} reached", self.max_nodes),
            });
        }

        let handle = Arc::new(Mutex::new(node));
        self.nodes.insert(address, Arc::clone(&handle));
        Ok(handle)
    }

    /// Get a node by address
    #[must_use]
    pub fn get(&self, address: &str) -> Option<NodeHandle> {
        self.nodes.get(address).cloned()
    }

    /// Registered addresses, sorted
    #[must_use]
    pub fn addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.nodes.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Address to node mapping
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, NodeHandle> {
        self.nodes.clone()
    }

    /// Number of registered nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
