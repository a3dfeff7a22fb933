//! Troubleshooting output for failed node operations

use bluechi_provision_core::client::ClientError;
use bluechi_provision_core::node::{NodeConfig, NodeError};
use console::style;

/// Hints for the most likely cause of a failed node operation
pub fn hints(err: &NodeError, node: &NodeConfig) -> Vec<String> {
    let target = format!("{}@{}", node.ssh.user, node.ssh.host);
    match err.client_error() {
        Some(ClientError::Network(_)) => vec![
            format!("Verify the node is reachable: ssh {target}"),
            "Check the host and port in the nodes file".to_string(),
        ],
        Some(ClientError::Auth { .. }) | Some(ClientError::KeyRead { .. }) => {
            let mut hints = vec![format!("Verify SSH access: ssh {target}")];
            match node.ssh.private_key_path.as_deref() {
                Some(key) if !key.is_empty() => {
                    hints.push(format!("Check the private key is readable: {key}"))
                }
                _ => hints.push("Set ssh.private_key_path or ssh.password".to_string()),
            }
            hints
        }
        Some(ClientError::HostKey(_)) => vec![
            format!("Add the host key: ssh-keyscan {} >> ~/.ssh/known_hosts", node.ssh.host),
            "Or set ssh.accept_host_key_insecure for throwaway machines".to_string(),
        ],
        Some(ClientError::RemoteExec { output, .. }) if output.contains("sudo") => vec![
            format!("Non-root users need passwordless sudo on {}", node.ssh.host),
        ],
        Some(ClientError::Timeout { .. }) => {
            vec!["Raise the limit with --command-timeout".to_string()]
        }
        _ => Vec::new(),
    }
}

/// Print a failed node operation with troubleshooting hints
pub fn show_node_error(err: &NodeError, node: &NodeConfig) {
    eprintln!();
    eprintln!("  {err}");

    let hints = hints(err, node);
    if !hints.is_empty() {
        eprintln!();
        eprintln!("{}", style("Troubleshooting:").yellow());
        for (i, hint) in hints.iter().enumerate() {
            eprintln!("  {}. {hint}", i + 1);
        }
    }
}
