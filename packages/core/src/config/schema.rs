//! Configuration schema for bluechi-provision
//!
//! Defines the structure and defaults for the config.json file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::{ClientError, ClientOptions, RemovePolicy, expand_home};

/// Tool-wide settings
///
/// Serialized to/from `~/.config/bluechi-provision/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Config file version for migrations
    pub version: u32,

    /// known_hosts file used for host key checks (default: ~/.ssh/known_hosts)
    #[serde(default)]
    pub known_hosts_path: Option<String>,

    /// Seconds a single remote command may take (default: None, wait forever)
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,

    /// Treat removing an already absent config file as success (default: false)
    #[serde(default)]
    pub idempotent_remove: bool,

    /// Use the no-op client instead of SSH (default: false)
    #[serde(default)]
    pub use_mock: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            known_hosts_path: None,
            command_timeout_secs: None,
            idempotent_remove: false,
            use_mock: false,
        }
    }
}

impl Config {
    /// Create a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Client options described by this config
    pub fn client_options(&self) -> Result<ClientOptions, ClientError> {
        let known_hosts_path = match self.known_hosts_path.as_deref() {
            Some(path) if !path.is_empty() => Some(expand_home(path)?),
            _ => None,
        };

        Ok(ClientOptions {
            known_hosts_path,
            command_timeout: self.command_timeout_secs.map(Duration::from_secs),
            remove_policy: if self.idempotent_remove {
                RemovePolicy::Idempotent
            } else {
                RemovePolicy::Strict
            },
        })
    }
}
