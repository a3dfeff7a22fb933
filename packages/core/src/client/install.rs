//! BlueChi package installation
//!
//! Installs the controller and/or agent packages on hosts that lack them.
//! Only the dnf based distributions BlueChi ships for are handled; other
//! hosts are left untouched.

use super::error::ClientError;
use super::inspect::{determine_os_family, is_service_installed};
use super::service::ServiceKind;
use super::transport::{Connection, RemoteShell};

/// OS identifiers packages can be installed on
pub const INSTALLABLE_OS_IDS: &[&str] = &["autosd", "centos"];

/// What `ensure_installed` ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Every requested component was already present (or none was requested)
    AlreadyInstalled,
    /// The listed packages were installed
    Installed(Vec<String>),
    /// The OS is not one packages are installed on; nothing was done
    UnsupportedOs(String),
}

/// Check whether an OS identifier is an install target
pub fn is_installable_os(id: &str) -> bool {
    INSTALLABLE_OS_IDS.contains(&id)
}

/// Build the install command for a package list
pub fn install_command<S: RemoteShell>(conn: &Connection<S>, packages: &[String]) -> String {
    conn.privileged(&format!("dnf install -y {}", packages.join(" ")))
}

/// Make sure the requested BlueChi components are installed
pub fn ensure_installed<S: RemoteShell>(
    conn: &mut Connection<S>,
    install_controller: bool,
    install_agent: bool,
) -> Result<InstallOutcome, ClientError> {
    let mut missing = Vec::new();
    for (kind, requested) in [
        (ServiceKind::Controller, install_controller),
        (ServiceKind::Agent, install_agent),
    ] {
        if requested && !is_service_installed(conn, kind.unit_name())? {
            missing.push(kind);
        }
    }

    if missing.is_empty() {
        tracing::debug!("BlueChi components already installed");
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    let os_id = determine_os_family(conn)?;
    if !is_installable_os(&os_id) {
        tracing::warn!(
            "Skipping BlueChi installation on unsupported OS '{}'",
            os_id
        );
        return Ok(InstallOutcome::UnsupportedOs(os_id));
    }

    let packages: Vec<String> = missing
        .iter()
        .flat_map(|kind| kind.packages().iter().map(|p| p.to_string()))
        .collect();

    let command = install_command(conn, &packages);
    tracing::info!("Installing {} on {} host", packages.join(", "), os_id);

    conn.exec_checked(&format!("install packages '{}'", packages.join(" ")), &command)?;

    Ok(InstallOutcome::Installed(packages))
}
