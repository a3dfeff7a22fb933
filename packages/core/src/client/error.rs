//! Client error types
//!
//! Errors that can occur while talking to a remote BlueChi node.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during remote client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// An operation was attempted before `connect`
    #[error("not connected")]
    NotConnected,

    /// TCP connect or SSH handshake failed
    #[error("SSH connection failed: {0}")]
    Network(String),

    /// The server rejected every offered authentication method
    #[error("SSH authentication failed for user '{user}': {reason}")]
    Auth { user: String, reason: String },

    /// Host key was unknown, mismatched, or could not be verified
    #[error("Host key verification failed: {0}")]
    HostKey(String),

    /// Private key file could not be read
    #[error("Failed to read private key {path}: {reason}")]
    KeyRead { path: String, reason: String },

    /// A remote command exited non-zero or its channel broke mid-command
    #[error("failed to {context}: {output}")]
    RemoteExec {
        /// What the command was trying to achieve
        context: String,
        /// The command line sent to the remote shell
        command: String,
        /// Exit status, `None` when the channel failed before one was reported
        exit_status: Option<i32>,
        /// Raw remote output (stdout followed by stderr)
        output: String,
    },

    /// A remote command exceeded the configured command timeout
    #[error("remote command timed out after {after:?}: {command}")]
    Timeout { command: String, after: Duration },

    /// ~/.ssh/config could not be read or parsed
    #[error("Failed to read SSH config: {0}")]
    SshConfig(String),

    /// /etc/os-release could not be interpreted
    #[error("Could not detect remote operating system: {0}")]
    OsDetection(String),
}

impl ClientError {
    /// Build a `RemoteExec` error for a channel failure without exit status
    pub(crate) fn channel(context: &str, command: &str, err: impl std::fmt::Display) -> Self {
        ClientError::RemoteExec {
            context: context.to_string(),
            command: command.to_string(),
            exit_status: None,
            output: err.to_string(),
        }
    }

    /// Exit status of a failed remote command, when one was reported
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            ClientError::RemoteExec { exit_status, .. } => *exit_status,
            _ => None,
        }
    }
}
