//! Node provisioning
//!
//! Drives a [`BlueChiClient`] through the apply, update and destroy sequences
//! for one inventory node. Every sequence opens a session, stops at the first
//! failed step, and always attempts to disconnect. Nothing is rolled back.

use super::error::NodeError;
use super::schema::NodeConfig;
use crate::client::BlueChiClient;

/// File name suffix of the controller drop-in
pub const CONTROLLER_FILE_SUFFIX: &str = "ctrl";

/// File name suffix of the agent drop-in
pub const AGENT_FILE_SUFFIX: &str = "agent";

/// Drop-in file name for a suffix, e.g. `ZZZ-ctrl.conf`
///
/// The `ZZZ-` prefix sorts the file after any packaged drop-ins so its
/// settings win.
pub fn config_file_name(suffix: &str) -> String {
    format!("ZZZ-{suffix}.conf")
}

fn step<T>(
    result: Result<T, crate::client::ClientError>,
    step: &'static str,
) -> Result<T, NodeError> {
    result.map_err(|error| {
        tracing::error!("{step}");
        NodeError::Step { step, error }
    })
}

/// Connect, run `body`, then disconnect
///
/// The body's error wins over a disconnect error.
fn with_session<F>(client: &mut dyn BlueChiClient, host: &str, body: F) -> Result<(), NodeError>
where
    F: FnOnce(&mut dyn BlueChiClient) -> Result<(), NodeError>,
{
    client.connect().map_err(|error| NodeError::Connect {
        host: host.to_string(),
        error,
    })?;

    let result = body(&mut *client);
    let disconnected = client.disconnect();

    match (result, disconnected) {
        (Err(e), Err(close_err)) => {
            tracing::debug!("Disconnect after failure also failed: {close_err}");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), close) => step(close, "Failed to disconnect"),
    }
}

/// Install, configure and start BlueChi on a node
///
/// Records the written drop-in names in `node` so later updates and
/// destroys target the same files.
pub fn apply_node(client: &mut dyn BlueChiClient, node: &mut NodeConfig) -> Result<(), NodeError> {
    let host = node.ssh.host.clone();
    with_session(client, &host, |client| {
        if node.install {
            step(
                client.install_bluechi(node.controller.is_some(), node.agent.is_some()),
                "Failed to install BlueChi",
            )?;
        }

        if let Some(controller) = node.controller.as_mut() {
            let file = config_file_name(CONTROLLER_FILE_SUFFIX);
            step(
                client.create_controller_config(&file, &controller.config),
                "Failed to create controller config",
            )?;
            controller.config_file = Some(file);
            step(client.restart_controller(), "Failed to start controller service")?;
        }

        if let Some(agent) = node.agent.as_mut() {
            let file = config_file_name(AGENT_FILE_SUFFIX);
            step(
                client.create_agent_config(&file, &agent.config),
                "Failed to create agent config",
            )?;
            agent.config_file = Some(file);
            step(client.restart_agent(), "Failed to start agent service")?;
        }

        Ok(())
    })?;

    tracing::info!("Applied BlueChi configuration on {host}");
    Ok(())
}

/// Rewrite the drop-ins of an applied node and start its services
pub fn update_node(client: &mut dyn BlueChiClient, node: &NodeConfig) -> Result<(), NodeError> {
    with_session(client, &node.ssh.host, |client| {
        if let Some(controller) = &node.controller {
            let file = recorded_or_default(&controller.config_file, CONTROLLER_FILE_SUFFIX);
            step(
                client.create_controller_config(&file, &controller.config),
                "Failed to update controller config",
            )?;
            step(client.restart_controller(), "Failed to start controller service")?;
        }

        if let Some(agent) = &node.agent {
            let file = recorded_or_default(&agent.config_file, AGENT_FILE_SUFFIX);
            step(
                client.create_agent_config(&file, &agent.config),
                "Failed to update agent config",
            )?;
            step(client.restart_agent(), "Failed to start agent service")?;
        }

        Ok(())
    })?;

    tracing::info!("Updated BlueChi configuration on {}", node.ssh.host);
    Ok(())
}

/// Remove the drop-ins of a node and stop its services
pub fn destroy_node(client: &mut dyn BlueChiClient, node: &NodeConfig) -> Result<(), NodeError> {
    with_session(client, &node.ssh.host, |client| {
        if let Some(controller) = &node.controller {
            let file = recorded_or_default(&controller.config_file, CONTROLLER_FILE_SUFFIX);
            step(
                client.remove_controller_config(&file),
                "Failed to remove controller config",
            )?;
            step(client.stop_controller(), "Failed to stop controller service")?;
        }

        if let Some(agent) = &node.agent {
            let file = recorded_or_default(&agent.config_file, AGENT_FILE_SUFFIX);
            step(client.remove_agent_config(&file), "Failed to remove agent config")?;
            step(client.stop_agent(), "Failed to stop agent service")?;
        }

        Ok(())
    })?;

    tracing::info!("Removed BlueChi configuration from {}", node.ssh.host);
    Ok(())
}

fn recorded_or_default(recorded: &Option<String>, suffix: &str) -> String {
    match recorded.as_deref() {
        Some(file) if !file.is_empty() => file.to_string(),
        _ => config_file_name(suffix),
    }
}
