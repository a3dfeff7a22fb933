//! Remote endpoint description
//!
//! Where and how to log in to a node: address, user and credentials.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::ClientError;

/// Default SSH port when neither `port` nor a `host:port` suffix is given
pub const DEFAULT_SSH_PORT: u16 = 22;

/// SSH login details for a remote node
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RemoteEndpoint {
    /// Hostname or IP address, optionally with a `:port` suffix
    pub host: String,

    /// SSH username (default: current user from whoami)
    #[serde(default = "default_user")]
    pub user: String,

    /// SSH port, takes precedence over a port suffix on `host`
    #[serde(default)]
    pub port: Option<u16>,

    /// Password offered after the private key
    #[serde(default)]
    pub password: Option<String>,

    /// Path to the private key, `~/` is expanded to the home directory
    #[serde(default)]
    pub private_key_path: Option<String>,

    /// Accept any host key without consulting known_hosts
    #[serde(default)]
    pub accept_host_key_insecure: bool,
}

fn default_user() -> String {
    whoami::username()
}

impl std::fmt::Debug for RemoteEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteEndpoint")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("private_key_path", &self.private_key_path)
            .field("accept_host_key_insecure", &self.accept_host_key_insecure)
            .finish()
    }
}

impl Default for RemoteEndpoint {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: default_user(),
            port: None,
            password: None,
            private_key_path: None,
            accept_host_key_insecure: false,
        }
    }
}

impl RemoteEndpoint {
    /// Create a new endpoint with just a host
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Builder pattern: set user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Builder pattern: set port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder pattern: set password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Builder pattern: set private key path
    pub fn with_private_key(mut self, path: impl Into<String>) -> Self {
        self.private_key_path = Some(path.into());
        self
    }

    /// Builder pattern: skip host key verification
    pub fn insecure(mut self) -> Self {
        self.accept_host_key_insecure = true;
        self
    }

    /// Hostname and port to dial
    ///
    /// An explicit `port` wins over a `name:port` suffix; the default is 22.
    pub fn target(&self) -> (String, u16) {
        let (name, suffix_port) = self.split_host();
        let port = self.port.or(suffix_port).unwrap_or(DEFAULT_SSH_PORT);
        (name, port)
    }

    /// Split `host` into the bare name and any `:port` suffix
    ///
    /// Bracketed IPv6 (`[::1]:2222`) is understood; a bare IPv6 address is
    /// taken as-is.
    pub fn split_host(&self) -> (String, Option<u16>) {
        let host = self.host.trim();

        if let Some(rest) = host.strip_prefix('[') {
            return match rest.split_once(']') {
                Some((addr, tail)) => (
                    addr.to_string(),
                    tail.strip_prefix(':').and_then(|p| p.parse().ok()),
                ),
                None => (host.to_string(), None),
            };
        }

        match host.split_once(':') {
            Some((name, port)) if !port.contains(':') => match port.parse::<u16>() {
                Ok(port) => (name.to_string(), Some(port)),
                Err(_) => (host.to_string(), None),
            },
            _ => (host.to_string(), None),
        }
    }

    /// Password, if one was given and is non-empty
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Private key path with `~/` expanded, if one was given and is non-empty
    pub fn private_key(&self) -> Result<Option<PathBuf>, ClientError> {
        match self.private_key_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => expand_home(path).map(Some),
            None => Ok(None),
        }
    }
}

/// Expand a leading `~/` to the caller's home directory
pub fn expand_home(path: &str) -> Result<PathBuf, ClientError> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir().ok_or_else(|| ClientError::KeyRead {
                path: path.to_string(),
                reason: "could not determine home directory".to_string(),
            })?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}
