//! No-op client for dry runs and tests

use super::error::ClientError;
use super::render::{AgentConfig, ControllerConfig};
use super::BlueChiClient;

/// Client that reports success for everything and never connects anywhere
#[derive(Debug, Clone, Copy, Default)]
pub struct MockClient;

impl MockClient {
    pub fn new() -> Self {
        Self
    }
}

impl BlueChiClient for MockClient {
    fn connect(&mut self) -> Result<(), ClientError> {
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), ClientError> {
        Ok(())
    }

    fn install_bluechi(&mut self, _controller: bool, _agent: bool) -> Result<(), ClientError> {
        Ok(())
    }

    fn create_controller_config(
        &mut self,
        _file: &str,
        _config: &ControllerConfig,
    ) -> Result<(), ClientError> {
        Ok(())
    }

    fn remove_controller_config(&mut self, _file: &str) -> Result<(), ClientError> {
        Ok(())
    }

    fn restart_controller(&mut self) -> Result<(), ClientError> {
        Ok(())
    }

    fn stop_controller(&mut self) -> Result<(), ClientError> {
        Ok(())
    }

    fn create_agent_config(&mut self, _file: &str, _config: &AgentConfig) -> Result<(), ClientError> {
        Ok(())
    }

    fn remove_agent_config(&mut self, _file: &str) -> Result<(), ClientError> {
        Ok(())
    }

    fn restart_agent(&mut self) -> Result<(), ClientError> {
        Ok(())
    }

    fn stop_agent(&mut self) -> Result<(), ClientError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientOptions, RemoteEndpoint, new_client};

    #[test]
    fn test_mock_succeeds_without_connect() {
        let mut client = MockClient::new();
        assert!(client.create_agent_config("ZZZ-agent.conf", &AgentConfig::new("n", "h", 1)).is_ok());
        assert!(client.remove_controller_config("missing.conf").is_ok());
        assert!(client.stop_agent().is_ok());
        assert!(client.disconnect().is_ok());
    }

    #[test]
    fn test_new_client_selects_mock() {
        // Unreachable endpoint: only the mock can connect to it
        let endpoint = RemoteEndpoint::new("203.0.113.1:1").with_password("x");
        let mut client = new_client(endpoint, ClientOptions::default(), true);

        client.connect().unwrap();
        client.install_bluechi(true, true).unwrap();
        client
            .create_controller_config("ZZZ-ctrl.conf", &ControllerConfig::default())
            .unwrap();
        client.restart_controller().unwrap();
        client.disconnect().unwrap();
    }
}
