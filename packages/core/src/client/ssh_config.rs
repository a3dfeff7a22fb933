//! SSH config file lookup
//!
//! Fills gaps in a [`RemoteEndpoint`] from the user's ~/.ssh/config.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ssh2_config::{ParseRule, SshConfig};

use super::endpoint::RemoteEndpoint;
use super::error::ClientError;

/// Settings found in an SSH config for a host alias
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SshConfigMatch {
    /// HostName the alias points at
    pub host_name: Option<String>,
    /// Port from SSH config
    pub port: Option<u16>,
    /// First IdentityFile from SSH config
    pub identity_file: Option<String>,
}

impl SshConfigMatch {
    /// Check if any useful settings were found
    pub fn has_settings(&self) -> bool {
        self.host_name.is_some() || self.port.is_some() || self.identity_file.is_some()
    }
}

/// Get the path to the user's SSH config file
pub fn get_ssh_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ssh").join("config"))
}

/// Query an SSH config file for a host alias
///
/// A missing file yields an empty match.
pub fn query_ssh_config(config_path: &Path, alias: &str) -> Result<SshConfigMatch, ClientError> {
    if !config_path.exists() {
        tracing::debug!("No SSH config file at {}", config_path.display());
        return Ok(SshConfigMatch::default());
    }

    let file = File::open(config_path).map_err(|e| {
        ClientError::SshConfig(format!("Failed to open {}: {}", config_path.display(), e))
    })?;
    let mut reader = BufReader::new(file);

    let config = SshConfig::default()
        .parse(&mut reader, ParseRule::ALLOW_UNKNOWN_FIELDS)
        .map_err(|e| ClientError::SshConfig(format!("Failed to parse SSH config: {e}")))?;

    let params = config.query(alias);

    Ok(SshConfigMatch {
        host_name: params.host_name,
        port: params.port,
        identity_file: params
            .identity_file
            .and_then(|files| files.first().map(|f| f.to_string_lossy().to_string())),
    })
}

impl RemoteEndpoint {
    /// Fill host, port and private key from an SSH config match
    ///
    /// Values set explicitly on the endpoint are kept. A `name:port` suffix
    /// on `host` counts as an explicit port and moves into `port`.
    pub fn apply_ssh_config(&mut self, found: &SshConfigMatch) {
        let (name, suffix_port) = self.split_host();
        self.port = self.port.or(suffix_port).or(found.port);
        self.host = found.host_name.clone().unwrap_or(name);
        if self.private_key_path.as_deref().is_none_or(str::is_empty) {
            if let Some(key) = &found.identity_file {
                self.private_key_path = Some(key.clone());
            }
        }
    }

    /// Resolve this endpoint's host as an alias in ~/.ssh/config
    pub fn with_ssh_config(self) -> Result<Self, ClientError> {
        match get_ssh_config_path() {
            Some(path) => self.with_ssh_config_from(&path),
            None => Ok(self),
        }
    }

    /// Resolve this endpoint's host as an alias in the SSH config at `config_path`
    ///
    /// The alias is looked up without any `:port` suffix.
    pub fn with_ssh_config_from(mut self, config_path: &Path) -> Result<Self, ClientError> {
        let (alias, _) = self.split_host();
        let found = query_ssh_config(config_path, &alias)?;
        if found.has_settings() {
            tracing::debug!("Applying SSH config settings for '{}'", alias);
            self.apply_ssh_config(&found);
        }
        Ok(self)
    }
}
