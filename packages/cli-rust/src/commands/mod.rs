//! CLI command implementations
//!
//! Each command loads the node inventory, looks up one node and drives it
//! through the core provisioning functions.

mod apply;
mod destroy;
mod list;
mod render;
mod update;

use std::path::PathBuf;

use anyhow::Result;
use bluechi_provision_core::client::{BlueChiClient, ClientOptions, new_client};
use bluechi_provision_core::node::{NodeConfig, NodesFile, load_nodes_from, save_nodes_to};

pub use apply::{ApplyArgs, cmd_apply};
pub use destroy::{DestroyArgs, cmd_destroy};
pub use list::{ListArgs, cmd_list};
pub use render::{RenderArgs, cmd_render};
pub use test::{TestArgs, cmd_test};
pub use update::{UpdateArgs, cmd_update};

/// Settings shared by every command
pub struct Context {
    /// Use the no-op client instead of SSH
    pub use_mock: bool,
    pub options: ClientOptions,
    pub nodes_path: PathBuf,
    pub quiet: bool,
    pub verbose: u8,
}

impl Context {
    pub fn load_nodes(&self) -> Result<NodesFile> {
        Ok(load_nodes_from(&self.nodes_path)?)
    }

    pub fn save_nodes(&self, nodes: &NodesFile) -> Result<()> {
        Ok(save_nodes_to(nodes, &self.nodes_path)?)
    }

    /// Look up a node, with a hint pointing at the inventory when missing
    pub fn node(&self, nodes: &NodesFile, name: &str) -> Result<NodeConfig> {
        nodes.get_node(name).cloned().map_err(|_| {
            anyhow::anyhow!(
                "Node '{}' not found in {}",
                name,
                self.nodes_path.display()
            )
        })
    }

    /// Client for a node, honouring `--mock` and ~/.ssh/config
    pub fn client_for(&self, node: &NodeConfig) -> Result<Box<dyn BlueChiClient>> {
        let endpoint = node.endpoint()?;
        tracing::debug!(
            "Using {} client for {}",
            if self.use_mock { "mock" } else { "SSH" },
            endpoint.host
        );
        Ok(new_client(endpoint, self.options.clone(), self.use_mock))
    }
}

/// Comma separated list of the BlueChi roles a node carries
pub fn roles(node: &NodeConfig) -> String {
    let mut roles = Vec::new();
    if node.controller.is_some() {
        roles.push("controller");
    }
    if node.agent.is_some() {
        roles.push("agent");
    }
    if roles.is_empty() {
        "-".to_string()
    } else {
        roles.join(", ")
    }
}
