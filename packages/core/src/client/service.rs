//! BlueChi service kinds
//!
//! Maps controller/agent to their unit, packages and drop-in directory.

/// Drop-in directory for controller configuration
pub const CONTROLLER_CONFD_DIR: &str = "/etc/bluechi/controller.conf.d/";

/// Drop-in directory for agent configuration
pub const AGENT_CONFD_DIR: &str = "/etc/bluechi/agent.conf.d/";

/// Which BlueChi component an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Controller,
    Agent,
}

impl ServiceKind {
    /// systemd service name
    pub fn service_name(self) -> &'static str {
        match self {
            ServiceKind::Controller => "bluechi-controller",
            ServiceKind::Agent => "bluechi-agent",
        }
    }

    /// Unit file name as listed by `systemctl list-unit-files`
    pub fn unit_name(self) -> &'static str {
        match self {
            ServiceKind::Controller => "bluechi-controller.service",
            ServiceKind::Agent => "bluechi-agent.service",
        }
    }

    /// Packages that provide this component
    pub fn packages(self) -> &'static [&'static str] {
        match self {
            ServiceKind::Controller => &["bluechi-controller", "bluechi-ctl"],
            ServiceKind::Agent => &["bluechi-agent"],
        }
    }

    /// Directory config drop-ins are written to
    pub fn config_dir(self) -> &'static str {
        match self {
            ServiceKind::Controller => CONTROLLER_CONFD_DIR,
            ServiceKind::Agent => AGENT_CONFD_DIR,
        }
    }

    /// Full remote path of a drop-in file
    ///
    /// The file name is appended as given.
    pub fn config_path(self, filename: &str) -> String {
        format!("{}{}", self.config_dir(), filename)
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceKind::Controller => write!(f, "controller"),
            ServiceKind::Agent => write!(f, "agent"),
        }
    }
}
