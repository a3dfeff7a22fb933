//! Remote BlueChi client
//!
//! Provides functionality for configuring BlueChi on a remote node:
//! - SSH transport with cached privilege level
//! - Host inspection and package installation
//! - Config drop-in rendering, writing and removal
//! - Service start/stop
//!
//! Callers work against the [`BlueChiClient`] trait. [`SshClient`] does the
//! real work, [`MockClient`] succeeds without touching the network.

mod endpoint;
mod error;
mod inspect;
mod install;
mod mock;
mod remote_config;
mod render;
mod service;
mod ssh;
mod ssh_config;
#[cfg(test)]
pub(crate) mod testing;
mod transport;

use std::path::PathBuf;
use std::time::Duration;

// Public exports
pub use endpoint::{DEFAULT_SSH_PORT, RemoteEndpoint, expand_home};
pub use error::ClientError;
pub use inspect::{OsRelease, determine_os_family, is_service_installed, parse_os_release};
pub use install::{INSTALLABLE_OS_IDS, InstallOutcome, ensure_installed, is_installable_os};
pub use mock::MockClient;
pub use remote_config::{RemovePolicy, remove_config, restart, stop, write_config};
pub use render::{AGENT_SECTION, AgentConfig, CONTROLLER_SECTION, ControllerConfig, RenderError};
pub use service::{AGENT_CONFD_DIR, CONTROLLER_CONFD_DIR, ServiceKind};
pub use ssh::SshClient;
pub use ssh_config::{SshConfigMatch, get_ssh_config_path, query_ssh_config};
pub use transport::{
    CommandOutput, Connection, Connector, RemoteShell, SUDO_PREFIX, SshConnector, SshSession,
    TransportOptions,
};

/// Everything a caller can ask of a BlueChi node
///
/// Implemented by [`SshClient`] and [`MockClient`]; the two are
/// interchangeable at the call site.
pub trait BlueChiClient {
    fn connect(&mut self) -> Result<(), ClientError>;
    fn disconnect(&mut self) -> Result<(), ClientError>;

    /// Install the controller and/or agent packages where missing
    fn install_bluechi(&mut self, controller: bool, agent: bool) -> Result<(), ClientError>;

    fn create_controller_config(
        &mut self,
        file: &str,
        config: &ControllerConfig,
    ) -> Result<(), ClientError>;
    fn remove_controller_config(&mut self, file: &str) -> Result<(), ClientError>;
    fn restart_controller(&mut self) -> Result<(), ClientError>;
    fn stop_controller(&mut self) -> Result<(), ClientError>;

    fn create_agent_config(&mut self, file: &str, config: &AgentConfig) -> Result<(), ClientError>;
    fn remove_agent_config(&mut self, file: &str) -> Result<(), ClientError>;
    fn restart_agent(&mut self) -> Result<(), ClientError>;
    fn stop_agent(&mut self) -> Result<(), ClientError>;
}

/// Tunables for [`SshClient`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientOptions {
    /// known_hosts file, defaults to ~/.ssh/known_hosts
    pub known_hosts_path: Option<PathBuf>,
    /// Per-command timeout, `None` waits indefinitely
    pub command_timeout: Option<Duration>,
    /// Whether removing an absent config file is an error
    pub remove_policy: RemovePolicy,
}

impl ClientOptions {
    pub fn transport(&self) -> TransportOptions {
        TransportOptions {
            known_hosts_path: self.known_hosts_path.clone(),
            command_timeout: self.command_timeout,
        }
    }
}

/// Create a client for an endpoint
///
/// `use_mock` selects the no-op [`MockClient`].
pub fn new_client(
    endpoint: RemoteEndpoint,
    options: ClientOptions,
    use_mock: bool,
) -> Box<dyn BlueChiClient> {
    if use_mock {
        Box::new(MockClient::new())
    } else {
        Box::new(SshClient::new(endpoint, options))
    }
}
