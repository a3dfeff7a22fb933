//! bluechi-provision-core - Core library for bluechi-provision
//!
//! Installs and configures BlueChi controllers and agents on remote
//! machines over SSH:
//! - [`client`]: SSH session, host inspection, package install, config
//!   drop-ins and service control behind the [`BlueChiClient`] trait
//! - [`node`]: node inventory and the apply/update/destroy sequences
//! - [`config`]: tool settings (config.json)

pub mod client;
pub mod config;
pub mod node;
pub mod version;

// Re-export version functions for Rust consumers
pub use version::get_version;

// Re-export the client surface
pub use client::{
    AgentConfig, BlueChiClient, ClientError, ClientOptions, ControllerConfig, MockClient,
    RemoteEndpoint, RemovePolicy, SshClient, new_client,
};

// Re-export config types
pub use config::{Config, load_config, load_config_from};

// Re-export node types
pub use node::{NodeConfig, NodeError, NodesFile, apply_node, destroy_node, update_node};
