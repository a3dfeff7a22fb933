//! Node inventory and provisioning
//!
//! Provides functionality for managing the nodes BlueChi runs on:
//! - Node configuration schema and storage (nodes.json)
//! - Apply, update and destroy sequences driven through a [`BlueChiClient`]
//!
//! [`BlueChiClient`]: crate::client::BlueChiClient

mod error;
mod provision;
mod schema;
mod storage;

// Public exports
pub use error::NodeError;
pub use provision::{
    AGENT_FILE_SUFFIX, CONTROLLER_FILE_SUFFIX, apply_node, config_file_name, destroy_node,
    update_node,
};
pub use schema::{NodeAgent, NodeConfig, NodeController, NodesFile};
pub use storage::{load_nodes_from, save_nodes_to};
