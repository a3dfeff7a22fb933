//! SSH backed BlueChi client

use super::endpoint::RemoteEndpoint;
use super::error::ClientError;
use super::install::ensure_installed;
use super::remote_config::{remove_config, restart, stop, write_config};
use super::render::{AgentConfig, ControllerConfig};
use super::service::ServiceKind;
use super::transport::{Connection, Connector, SshConnector};
use super::{BlueChiClient, ClientOptions};

/// Client that configures a node over SSH
///
/// Holds at most one live connection. Not meant to be shared between threads.
pub struct SshClient<C: Connector = SshConnector> {
    endpoint: RemoteEndpoint,
    options: ClientOptions,
    connector: C,
    conn: Option<Connection<C::Shell>>,
}

impl SshClient<SshConnector> {
    pub fn new(endpoint: RemoteEndpoint, options: ClientOptions) -> Self {
        Self::with_connector(endpoint, options, SshConnector)
    }
}

impl<C: Connector> SshClient<C> {
    /// Create a client that opens shells through `connector`
    pub fn with_connector(endpoint: RemoteEndpoint, options: ClientOptions, connector: C) -> Self {
        Self {
            endpoint,
            options,
            connector,
            conn: None,
        }
    }

    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Whether the login user is root, `None` before connect
    pub fn has_root(&self) -> Option<bool> {
        self.conn.as_ref().map(Connection::has_root)
    }

    fn session(&mut self) -> Result<&mut Connection<C::Shell>, ClientError> {
        self.conn.as_mut().ok_or(ClientError::NotConnected)
    }

    fn write(&mut self, kind: ServiceKind, file: &str, rendered: &str) -> Result<(), ClientError> {
        write_config(self.session()?, kind, file, rendered)
    }

    fn remove(&mut self, kind: ServiceKind, file: &str) -> Result<(), ClientError> {
        let policy = self.options.remove_policy;
        remove_config(self.session()?, kind, file, policy)
    }
}

impl<C: Connector> BlueChiClient for SshClient<C> {
    fn connect(&mut self) -> Result<(), ClientError> {
        if self.conn.is_some() {
            self.disconnect()?;
        }

        let shell = self
            .connector
            .connect(&self.endpoint, &self.options.transport())?;
        let conn = Connection::establish(shell)?;

        tracing::info!(
            "Connected to {} as {}{}",
            self.endpoint.host,
            self.endpoint.user,
            if conn.has_root() { " (root)" } else { "" }
        );
        self.conn = Some(conn);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), ClientError> {
        match self.conn.take() {
            Some(conn) => {
                tracing::debug!("Disconnecting from {}", self.endpoint.host);
                conn.close()
            }
            None => Ok(()),
        }
    }

    fn install_bluechi(&mut self, controller: bool, agent: bool) -> Result<(), ClientError> {
        let outcome = ensure_installed(self.session()?, controller, agent)?;
        tracing::debug!("Install outcome on {}: {:?}", self.endpoint.host, outcome);
        Ok(())
    }

    fn create_controller_config(
        &mut self,
        file: &str,
        config: &ControllerConfig,
    ) -> Result<(), ClientError> {
        self.write(ServiceKind::Controller, file, &config.render())
    }

    fn remove_controller_config(&mut self, file: &str) -> Result<(), ClientError> {
        self.remove(ServiceKind::Controller, file)
    }

    fn restart_controller(&mut self) -> Result<(), ClientError> {
        restart(self.session()?, ServiceKind::Controller)
    }

    fn stop_controller(&mut self) -> Result<(), ClientError> {
        stop(self.session()?, ServiceKind::Controller)
    }

    fn create_agent_config(&mut self, file: &str, config: &AgentConfig) -> Result<(), ClientError> {
        self.write(ServiceKind::Agent, file, &config.render())
    }

    fn remove_agent_config(&mut self, file: &str) -> Result<(), ClientError> {
        self.remove(ServiceKind::Agent, file)
    }

    fn restart_agent(&mut self) -> Result<(), ClientError> {
        restart(self.session()?, ServiceKind::Agent)
    }

    fn stop_agent(&mut self) -> Result<(), ClientError> {
        stop(self.session()?, ServiceKind::Agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RemovePolicy;
    use crate::client::testing::{ScriptedConnector, ScriptedShell};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn client(shell: &ScriptedShell) -> SshClient<ScriptedConnector> {
        SshClient::with_connector(
            RemoteEndpoint::new("node1").with_user("admin"),
            ClientOptions::default(),
            ScriptedConnector::new(shell.clone()),
        )
    }

    fn controller_config() -> ControllerConfig {
        ControllerConfig {
            allowed_node_names: vec!["node1".to_string(), "node2".to_string()],
            ..Default::default()
        }
        .with_manager_port(842)
    }

    #[test]
    fn test_operations_before_connect_fail() {
        let shell = ScriptedShell::new();
        let mut client = client(&shell);

        let err = client
            .create_controller_config("ZZZ-ctrl.conf", &controller_config())
            .unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));

        assert!(matches!(
            client.install_bluechi(true, true),
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(
            client.remove_agent_config("ZZZ-agent.conf"),
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(client.restart_agent(), Err(ClientError::NotConnected)));
        assert!(matches!(client.stop_controller(), Err(ClientError::NotConnected)));

        assert!(shell.commands().is_empty());
    }

    #[test]
    fn test_disconnect_without_session_is_noop() {
        let shell = ScriptedShell::new();
        let mut client = client(&shell);
        client.disconnect().unwrap();
        client.disconnect().unwrap();
        assert!(!shell.is_closed());
    }

    #[test]
    fn test_connect_caches_privilege() {
        let shell = ScriptedShell::new().respond("whoami", 0, "admin\n");
        let mut client = client(&shell);
        assert_eq!(client.has_root(), None);

        client.connect().unwrap();
        assert!(client.is_connected());
        assert_eq!(client.has_root(), Some(false));

        client.restart_agent().unwrap();
        client.stop_agent().unwrap();

        // whoami runs once, at connect time
        let whoami_count = shell.commands().iter().filter(|c| *c == "whoami").count();
        assert_eq!(whoami_count, 1);
    }

    #[test]
    fn test_connect_failure_leaves_client_disconnected() {
        let mut client = SshClient::with_connector(
            RemoteEndpoint::new("node1"),
            ClientOptions::default(),
            ScriptedConnector::refusing("connection refused"),
        );
        let err = client.connect().unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert!(!client.is_connected());
    }

    #[test]
    fn test_end_to_end_non_root() {
        let shell = ScriptedShell::new()
            .respond("whoami", 0, "admin\n")
            .respond("systemctl list-unit-files bluechi-controller.service", 1, "")
            .respond("systemctl list-unit-files bluechi-agent.service", 1, "")
            .respond("cat /etc/os-release", 0, "NAME=\"CentOS Stream\"\nID=\"centos\"\n");
        let mut client = client(&shell);

        client.connect().unwrap();
        client.install_bluechi(true, true).unwrap();
        client
            .create_controller_config("ZZZ-ctrl.conf", &controller_config())
            .unwrap();
        client.restart_controller().unwrap();
        client.disconnect().unwrap();

        let commands = shell.commands();
        let installs: Vec<_> = commands.iter().filter(|c| c.contains("dnf install")).collect();
        assert_eq!(
            installs,
            vec!["sudo -n dnf install -y bluechi-controller bluechi-ctl bluechi-agent"]
        );

        let rendered = controller_config().render();
        let write = commands
            .iter()
            .find(|c| c.contains("/etc/bluechi/controller.conf.d/ZZZ-ctrl.conf"))
            .unwrap();
        assert!(write.starts_with("sudo -n sh -c "));
        assert!(write.contains(&STANDARD.encode(rendered.as_bytes())));

        assert_eq!(
            commands.last().unwrap(),
            "sudo -n systemctl start bluechi-controller"
        );
        assert!(shell.is_closed());
        assert!(!client.is_connected());
    }

    #[test]
    fn test_remove_policy_is_applied() {
        let shell = ScriptedShell::new().respond("whoami", 0, "root\n");
        let mut client = SshClient::with_connector(
            RemoteEndpoint::new("node1"),
            ClientOptions {
                remove_policy: RemovePolicy::Idempotent,
                ..Default::default()
            },
            ScriptedConnector::new(shell.clone()),
        );

        client.connect().unwrap();
        client.remove_agent_config("ZZZ-agent.conf").unwrap();
        assert_eq!(
            shell.commands().last().unwrap(),
            "rm -f /etc/bluechi/agent.conf.d/ZZZ-agent.conf"
        );
    }

    #[test]
    fn test_failed_step_surfaces_once() {
        let shell = ScriptedShell::new()
            .respond("whoami", 0, "root\n")
            .respond("systemctl start bluechi-agent", 1, "Job failed");
        let mut client = client(&shell);
        client.connect().unwrap();

        let err = client.restart_agent().unwrap_err();
        assert_eq!(err.to_string(), "failed to restart agent service: Job failed");

        let starts = shell
            .commands()
            .iter()
            .filter(|c| c.contains("systemctl start"))
            .count();
        assert_eq!(starts, 1);
    }
}
