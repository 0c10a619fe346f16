//! In-process host

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::HostInterface;
use crate::Result;
use crate::nodes::{DeviceNode, NodeHandle, NodeRegistry};

/// Host that keeps nodes, notices and profile pushes in memory
#[derive(Debug, Default)]
pub struct LocalHost {
    registry: RwLock<NodeRegistry>,
    notices: RwLock<Vec<String>>,
    profile_pushes: AtomicU64,
}

impl LocalHost {
    /// Create a host accepting at most `max_nodes` device nodes
    #[must_use]
    pub fn new(max_nodes: usize) -> Self {
        Self {
            registry: RwLock::new(NodeRegistry::new(max_nodes)),
            notices: RwLock::new(Vec::new()),
            profile_pushes: AtomicU64::new(0),
        }
    }

    /// Look up a node by address
    pub async fn node(&self, address: &str) -> Option<NodeHandle> {
        self.registry.read().await.get(address)
    }

    /// Registered addresses, sorted
    pub async fn addresses(&self) -> Vec<String> {
        self.registry.read().await.addresses()
    }

    /// Show a notice to the user
    pub async fn add_notice(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::info!(notice = %text, "notice added");
        self.notices.write().await.push(text);
    }

    /// Notices currently shown
    pub async fn notices(&self) -> Vec<String> {
        self.notices.read().await.clone()
    }

    /// How many times the profile has been pushed
    #[must_use]
    pub fn profile_pushes(&self) -> u64 {
        self.profile_pushes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HostInterface for LocalHost {
    async fn get_nodes(&self) -> HashMap<String, NodeHandle> {
        self.registry.read().await.snapshot()
    }

    async fn add_node(&self, node: DeviceNode) -> Result<String> {
        let address = node.address().to_string();
        let name = node.name().to_string();
        self.registry.write().await.register(node)?;

        tracing::info!(%address, %name, "node added");
        Ok(address)
    }

    async fn update_profile(&self) -> Result<()> {
        let pushes = self.profile_pushes.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(pushes, "profile update requested");
        Ok(())
    }

    async fn remove_notices_all(&self) -> Result<()> {
        let mut notices = self.notices.write().await;
        let removed = notices.len();
        notices.clear();
        tracing::info!(removed, "notices cleared");
        Ok(())
    }
}
