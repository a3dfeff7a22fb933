//! Remote host inspection
//!
//! Answers questions about the remote machine: is a unit installed, which
//! operating system is it running.

use super::error::ClientError;
use super::transport::{Connection, RemoteShell};

/// Parsed /etc/os-release
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsRelease {
    /// Distribution ID (e.g., "centos", "autosd", "fedora")
    pub id: String,
    /// Space separated parent distributions
    pub id_like: String,
    /// Pretty name (e.g., "CentOS Stream 9")
    pub pretty_name: String,
    /// Version ID (e.g., "9")
    pub version_id: Option<String>,
}

/// Check whether a systemd unit file is installed
///
/// `systemctl list-unit-files` exits with 1 when nothing matches, which is
/// reported as "not installed" rather than an error.
pub fn is_service_installed<S: RemoteShell>(
    conn: &mut Connection<S>,
    unit: &str,
) -> Result<bool, ClientError> {
    let command = format!("systemctl list-unit-files {unit}");
    let output = conn.exec(&command)?;

    match output.exit_status {
        0 => Ok(output.stdout.contains(unit)),
        1 => Ok(false),
        status => Err(ClientError::RemoteExec {
            context: "list unit files".to_string(),
            command,
            exit_status: Some(status),
            output: output.combined(),
        }),
    }
}

/// Read /etc/os-release from the remote host
pub fn read_os_release<S: RemoteShell>(conn: &mut Connection<S>) -> Result<OsRelease, ClientError> {
    let output = conn.exec_checked("determine os", "cat /etc/os-release")?;
    parse_os_release(&output)
}

/// Determine the bare OS identifier of the remote host
pub fn determine_os_family<S: RemoteShell>(
    conn: &mut Connection<S>,
) -> Result<String, ClientError> {
    let release = read_os_release(conn)?;
    tracing::debug!(
        "Remote OS: {} ({})",
        release.pretty_name,
        release.version_id.as_deref().unwrap_or("unknown version")
    );
    Ok(release.id)
}

/// Parse /etc/os-release content
pub fn parse_os_release(content: &str) -> Result<OsRelease, ClientError> {
    let mut release = OsRelease::default();

    for line in content.lines() {
        if let Some((key, value)) = line.trim().split_once('=') {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'').trim();
            match key.trim() {
                "ID" => release.id = value.to_lowercase(),
                "ID_LIKE" => release.id_like = value.to_lowercase(),
                "PRETTY_NAME" => release.pretty_name = value.to_string(),
                "VERSION_ID" => release.version_id = Some(value.to_string()),
                _ => {}
            }
        }
    }

    if release.id.is_empty() {
        return Err(ClientError::OsDetection(
            "no ID entry in /etc/os-release".to_string(),
        ));
    }

    Ok(release)
}
