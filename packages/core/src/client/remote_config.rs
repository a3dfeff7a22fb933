//! Remote configuration and service lifecycle
//!
//! Writes and removes BlueChi drop-in files and starts/stops the services.
//!
//! File contents travel base64 encoded and are decoded on the remote side,
//! and every path is shell-quoted, so neither config values nor file names
//! can break out of the command.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::error::ClientError;
use super::service::ServiceKind;
use super::transport::{Connection, RemoteShell};

/// How removing a config file that does not exist is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovePolicy {
    /// Missing file is an error (`rm`)
    #[default]
    Strict,
    /// Missing file is fine (`rm -f`)
    Idempotent,
}

/// Build the command that overwrites `path` with `contents`
pub fn write_command<S: RemoteShell>(conn: &Connection<S>, path: &str, contents: &str) -> String {
    let payload = STANDARD.encode(contents.as_bytes());
    let script = format!(
        "printf '%s' {payload} | base64 -d > {}",
        shell_words::quote(path)
    );
    conn.privileged(&format!("sh -c {}", shell_words::quote(&script)))
}

/// Build the command that removes `path`
pub fn remove_command<S: RemoteShell>(
    conn: &Connection<S>,
    path: &str,
    policy: RemovePolicy,
) -> String {
    let rm = match policy {
        RemovePolicy::Strict => "rm",
        RemovePolicy::Idempotent => "rm -f",
    };
    conn.privileged(&format!("{rm} {}", shell_words::quote(path)))
}

/// Overwrite a config drop-in with rendered contents
pub fn write_config<S: RemoteShell>(
    conn: &mut Connection<S>,
    kind: ServiceKind,
    filename: &str,
    rendered: &str,
) -> Result<(), ClientError> {
    let path = kind.config_path(filename);
    let command = write_command(conn, &path, rendered);

    tracing::debug!("Writing {} config to {}", kind, path);
    conn.exec_checked(&format!("create {kind} config file"), &command)?;
    Ok(())
}

/// Delete a config drop-in
pub fn remove_config<S: RemoteShell>(
    conn: &mut Connection<S>,
    kind: ServiceKind,
    filename: &str,
    policy: RemovePolicy,
) -> Result<(), ClientError> {
    let path = kind.config_path(filename);
    let command = remove_command(conn, &path, policy);

    tracing::debug!("Removing {} config {}", kind, path);
    conn.exec_checked(&format!("remove {kind} config file"), &command)?;
    Ok(())
}

/// Start the service
///
/// A running service is left running; new drop-ins only take effect once it
/// is started fresh.
pub fn restart<S: RemoteShell>(conn: &mut Connection<S>, kind: ServiceKind) -> Result<(), ClientError> {
    let command = conn.privileged(&format!("systemctl start {}", kind.service_name()));
    conn.exec_checked(&format!("restart {kind} service"), &command)?;
    Ok(())
}

/// Stop the service
pub fn stop<S: RemoteShell>(conn: &mut Connection<S>, kind: ServiceKind) -> Result<(), ClientError> {
    let command = conn.privileged(&format!("systemctl stop {}", kind.service_name()));
    conn.exec_checked(&format!("stop {kind} service"), &command)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedShell;

    fn connect(user: &str, shell: &ScriptedShell) -> Connection<ScriptedShell> {
        let shell = shell.clone().respond("whoami", 0, &format!("{user}\n"));
        Connection::establish(shell).unwrap()
    }

    fn decode_payload(command: &str) -> String {
        let start = command.find("printf '\\''%s'\\'' ").unwrap() + "printf '\\''%s'\\'' ".len();
        let payload: String = command[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '+' || *c == '/' || *c == '=')
            .collect();
        String::from_utf8(STANDARD.decode(payload).unwrap()).unwrap()
    }

    #[test]
    fn test_write_config_as_root() {
        let shell = ScriptedShell::new();
        let mut conn = connect("root", &shell);

        write_config(
            &mut conn,
            ServiceKind::Controller,
            "ZZZ-ctrl.conf",
            "[bluechi-controller]\nAllowedNodeNames=a\n",
        )
        .unwrap();

        let commands = shell.commands();
        let write = commands.last().unwrap();
        assert!(write.starts_with("sh -c "));
        assert!(write.contains("base64 -d > /etc/bluechi/controller.conf.d/ZZZ-ctrl.conf"));
        assert_eq!(
            decode_payload(write),
            "[bluechi-controller]\nAllowedNodeNames=a\n"
        );
    }

    #[test]
    fn test_write_config_with_sudo() {
        let shell = ScriptedShell::new();
        let mut conn = connect("admin", &shell);

        write_config(&mut conn, ServiceKind::Agent, "ZZZ-agent.conf", "x").unwrap();

        let commands = shell.commands();
        let write = commands.last().unwrap();
        assert!(write.starts_with("sudo -n sh -c "));
        assert!(write.contains("/etc/bluechi/agent.conf.d/ZZZ-agent.conf"));
    }

    #[test]
    fn test_write_config_fences_shell_metacharacters() {
        let shell = ScriptedShell::new();
        let mut conn = connect("root", &shell);

        let hostile = "[bluechi-agent]\nNodeName=x\"; rm -rf / #'$(reboot)\n";
        write_config(&mut conn, ServiceKind::Agent, "a b';reboot;'.conf", hostile).unwrap();

        let commands = shell.commands();
        let write = commands.last().unwrap();
        assert!(!write.contains("rm -rf"));
        assert!(!write.contains("$(reboot)"));
        assert_eq!(decode_payload(write), hostile);

        let parsed = shell_words::split(write).unwrap();
        assert_eq!(parsed[0], "sh");
        assert_eq!(parsed[1], "-c");
        let inner = shell_words::split(&parsed[2]).unwrap();
        assert_eq!(
            inner.last().unwrap(),
            "/etc/bluechi/agent.conf.d/a b';reboot;'.conf"
        );
    }

    #[test]
    fn test_write_config_failure() {
        let shell = ScriptedShell::new().respond("base64 -d", 1, "Permission denied");
        let mut conn = connect("admin", &shell);

        let err = write_config(&mut conn, ServiceKind::Controller, "ZZZ-ctrl.conf", "x").unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to create controller config file: Permission denied"
        );
    }

    #[test]
    fn test_remove_config_strict() {
        let shell = ScriptedShell::new().respond(
            "rm /etc/bluechi/agent.conf.d/ZZZ-agent.conf",
            1,
            "rm: cannot remove '/etc/bluechi/agent.conf.d/ZZZ-agent.conf': No such file or directory",
        );
        let mut conn = connect("root", &shell);

        let err = remove_config(&mut conn, ServiceKind::Agent, "ZZZ-agent.conf", RemovePolicy::Strict)
            .unwrap_err();
        assert!(err.to_string().contains("No such file or directory"));
    }

    #[test]
    fn test_remove_config_idempotent() {
        let shell = ScriptedShell::new();
        let mut conn = connect("admin", &shell);

        remove_config(
            &mut conn,
            ServiceKind::Controller,
            "ZZZ-ctrl.conf",
            RemovePolicy::Idempotent,
        )
        .unwrap();

        assert_eq!(
            shell.commands().last().unwrap(),
            "sudo -n rm -f /etc/bluechi/controller.conf.d/ZZZ-ctrl.conf"
        );
    }

    #[test]
    fn test_restart_starts_service() {
        let shell = ScriptedShell::new();
        let mut conn = connect("admin", &shell);

        restart(&mut conn, ServiceKind::Controller).unwrap();
        assert_eq!(
            shell.commands().last().unwrap(),
            "sudo -n systemctl start bluechi-controller"
        );
    }

    #[test]
    fn test_stop_service_as_root() {
        let shell = ScriptedShell::new();
        let mut conn = connect("root", &shell);

        stop(&mut conn, ServiceKind::Agent).unwrap();
        assert_eq!(shell.commands().last().unwrap(), "systemctl stop bluechi-agent");
    }

    #[test]
    fn test_stop_failure_is_reported() {
        let shell = ScriptedShell::new().respond("systemctl stop", 5, "Unit not loaded.");
        let mut conn = connect("root", &shell);

        let err = stop(&mut conn, ServiceKind::Agent).unwrap_err();
        assert_eq!(err.exit_status(), Some(5));
        assert!(err.to_string().starts_with("failed to stop agent service"));
    }
}
