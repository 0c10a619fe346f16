//! Host plugin interface consumed by the controller
//!
//! The real host registers nodes with the supervisor, pushes profiles and
//! manages notices. [`LocalHost`] keeps all of that in process.

mod local;

use std::collections::HashMap;

use async_trait::async_trait;

pub use local::LocalHost;

use crate::Result;
use crate::nodes::{DeviceNode, NodeHandle};

/// Operations the node server needs from its host
#[async_trait]
pub trait HostInterface: Send + Sync {
    /// Registered nodes by address
    async fn get_nodes(&self) -> HashMap<String, NodeHandle>;

    /// Register a new node, returning its address
    async fn add_node(&self, node: DeviceNode) -> Result<String>;

    /// Push profile files to the supervisor
    async fn update_profile(&self) -> Result<()>;

    /// Clear every notice shown to the user
    async fn remove_notices_all(&self) -> Result<()>;
}
