//! Node inventory schema
//!
//! Data structures for the nodes.json file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::NodeError;
use crate::client::{AgentConfig, ControllerConfig, RemoteEndpoint};

/// Controller section of a node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeController {
    #[serde(flatten)]
    pub config: ControllerConfig,

    /// Drop-in file written by `apply`, reused by `update` and `destroy`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
}

/// Agent section of a node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeAgent {
    #[serde(flatten)]
    pub config: AgentConfig,

    /// Drop-in file written by `apply`, reused by `update` and `destroy`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
}

/// One machine to provision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// How to reach the machine
    pub ssh: RemoteEndpoint,

    /// Fill missing port/key from ~/.ssh/config (default: false)
    #[serde(default)]
    pub use_ssh_config: bool,

    /// Install missing BlueChi packages before configuring (default: false)
    #[serde(default)]
    pub install: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<NodeController>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<NodeAgent>,
}

impl NodeConfig {
    /// Create a node with only an SSH endpoint
    pub fn new(ssh: RemoteEndpoint) -> Self {
        Self {
            ssh,
            use_ssh_config: false,
            install: false,
            controller: None,
            agent: None,
        }
    }

    /// Builder pattern: add a controller section
    pub fn with_controller(mut self, config: ControllerConfig) -> Self {
        self.controller = Some(NodeController {
            config,
            config_file: None,
        });
        self
    }

    /// Builder pattern: add an agent section
    pub fn with_agent(mut self, config: AgentConfig) -> Self {
        self.agent = Some(NodeAgent {
            config,
            config_file: None,
        });
        self
    }

    /// Builder pattern: install packages on apply
    pub fn with_install(mut self) -> Self {
        self.install = true;
        self
    }

    /// Endpoint to connect to, with ~/.ssh/config applied when requested
    pub fn endpoint(&self) -> Result<RemoteEndpoint, NodeError> {
        if self.ssh.host.trim().is_empty() {
            return Err(NodeError::InvalidConfig("ssh.host is empty".to_string()));
        }
        if !self.use_ssh_config {
            return Ok(self.ssh.clone());
        }
        self.ssh
            .clone()
            .with_ssh_config()
            .map_err(|e| NodeError::InvalidConfig(e.to_string()))
    }
}

/// Root structure for nodes.json file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NodesFile {
    /// Schema version for future migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Map of node name to configuration
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeConfig>,
}

fn default_version() -> u32 {
    1
}

impl NodesFile {
    /// Create empty nodes file
    pub fn new() -> Self {
        Self {
            version: default_version(),
            nodes: BTreeMap::new(),
        }
    }

    /// Add or replace a node
    pub fn add_node(&mut self, name: impl Into<String>, config: NodeConfig) {
        self.nodes.insert(name.into(), config);
    }

    pub fn get_node(&self, name: &str) -> Result<&NodeConfig, NodeError> {
        self.nodes
            .get(name)
            .ok_or_else(|| NodeError::NotFound(name.to_string()))
    }

    pub fn get_node_mut(&mut self, name: &str) -> Result<&mut NodeConfig, NodeError> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| NodeError::NotFound(name.to_string()))
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }
}
