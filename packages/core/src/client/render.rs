//! BlueChi configuration rendering
//!
//! Turns controller and agent settings into the INI drop-in files BlueChi
//! reads, and parses them back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Section header of controller drop-ins
pub const CONTROLLER_SECTION: &str = "bluechi-controller";

/// Section header of agent drop-ins
pub const AGENT_SECTION: &str = "bluechi-agent";

/// Separator between allowed node names, continues the value on a new line
const NODE_NAME_SEPARATOR: &str = ",\n\t";

/// Errors reading a rendered drop-in back
#[derive(Error, Debug, PartialEq)]
pub enum RenderError {
    #[error("expected section [{0}]")]
    MissingSection(&'static str),

    #[error("missing required key {0}")]
    MissingField(&'static str),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("unknown key {0}")]
    UnknownKey(String),
}

/// Controller settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Node names allowed to connect
    pub allowed_node_names: Vec<String>,

    /// Port the controller listens on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_is_quiet: Option<bool>,
}

/// Agent settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Name this agent registers with
    pub node_name: String,

    /// Controller host to connect to
    pub manager_host: String,

    /// Controller port to connect to
    pub manager_port: u16,

    /// Full controller address, replaces host and port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_address: Option<String>,

    /// Connection test interval in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_interval: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_is_quiet: Option<bool>,
}

/// Accumulates `Key=Value` lines under a section header
struct IniWriter {
    out: String,
}

impl IniWriter {
    fn section(name: &str) -> Self {
        Self {
            out: format!("[{name}]\n"),
        }
    }

    fn line(&mut self, key: &str, value: impl std::fmt::Display) {
        self.out.push_str(&format!("{key}={value}\n"));
    }

    fn optional(&mut self, key: &str, value: Option<impl std::fmt::Display>) {
        if let Some(value) = value {
            self.line(key, value);
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

impl ControllerConfig {
    /// Builder pattern: set manager port
    pub fn with_manager_port(mut self, port: u16) -> Self {
        self.manager_port = Some(port);
        self
    }

    /// Render the `[bluechi-controller]` drop-in
    pub fn render(&self) -> String {
        let mut ini = IniWriter::section(CONTROLLER_SECTION);
        ini.line(
            "AllowedNodeNames",
            self.allowed_node_names.join(NODE_NAME_SEPARATOR),
        );
        ini.optional("ManagerPort", self.manager_port);
        ini.optional("LogLevel", self.log_level.as_deref());
        ini.optional("LogTarget", self.log_target.as_deref());
        ini.optional("LogIsQuiet", self.log_is_quiet);
        ini.finish()
    }

    /// Parse a rendered controller drop-in
    ///
    /// `AllowedNodeNames` is read the way BlueChi reads it: each name is
    /// trimmed and empty entries are dropped. Settings whose names are
    /// already trimmed and non-empty round-trip exactly.
    pub fn parse(text: &str) -> Result<Self, RenderError> {
        let entries = parse_section(text, CONTROLLER_SECTION)?;
        let mut config = ControllerConfig::default();
        let mut seen_names = false;

        for (key, value) in entries {
            match key.as_str() {
                "AllowedNodeNames" => {
                    seen_names = true;
                    config.allowed_node_names = value
                        .split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                "ManagerPort" => config.manager_port = Some(parse_value(&key, &value)?),
                "LogLevel" => config.log_level = Some(value),
                "LogTarget" => config.log_target = Some(value),
                "LogIsQuiet" => config.log_is_quiet = Some(parse_value(&key, &value)?),
                _ => return Err(RenderError::UnknownKey(key)),
            }
        }

        if !seen_names {
            return Err(RenderError::MissingField("AllowedNodeNames"));
        }
        Ok(config)
    }
}

impl AgentConfig {
    /// Create agent settings from the required fields
    pub fn new(
        node_name: impl Into<String>,
        manager_host: impl Into<String>,
        manager_port: u16,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            manager_host: manager_host.into(),
            manager_port,
            ..Default::default()
        }
    }

    /// Render the `[bluechi-agent]` drop-in
    pub fn render(&self) -> String {
        let mut ini = IniWriter::section(AGENT_SECTION);
        ini.line("NodeName", &self.node_name);
        ini.line("ManagerHost", &self.manager_host);
        ini.line("ManagerPort", self.manager_port);
        ini.optional("ManagerAddress", self.manager_address.as_deref());
        ini.optional("HeartbeatInterval", self.heartbeat_interval);
        ini.optional("LogLevel", self.log_level.as_deref());
        ini.optional("LogTarget", self.log_target.as_deref());
        ini.optional("LogIsQuiet", self.log_is_quiet);
        ini.finish()
    }

    /// Parse a rendered agent drop-in
    pub fn parse(text: &str) -> Result<Self, RenderError> {
        let entries = parse_section(text, AGENT_SECTION)?;
        let mut node_name = None;
        let mut manager_host = None;
        let mut manager_port = None;
        let mut config = AgentConfig::default();

        for (key, value) in entries {
            match key.as_str() {
                "NodeName" => node_name = Some(value),
                "ManagerHost" => manager_host = Some(value),
                "ManagerPort" => manager_port = Some(parse_value(&key, &value)?),
                "ManagerAddress" => config.manager_address = Some(value),
                "HeartbeatInterval" => config.heartbeat_interval = Some(parse_value(&key, &value)?),
                "LogLevel" => config.log_level = Some(value),
                "LogTarget" => config.log_target = Some(value),
                "LogIsQuiet" => config.log_is_quiet = Some(parse_value(&key, &value)?),
                _ => return Err(RenderError::UnknownKey(key)),
            }
        }

        config.node_name = node_name.ok_or(RenderError::MissingField("NodeName"))?;
        config.manager_host = manager_host.ok_or(RenderError::MissingField("ManagerHost"))?;
        config.manager_port = manager_port.ok_or(RenderError::MissingField("ManagerPort"))?;
        Ok(config)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, RenderError> {
    value.trim().parse().map_err(|_| RenderError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Split a single-section INI text into `(key, value)` pairs
///
/// Indented lines continue the previous value. Blank lines and `#`/`;`
/// comments are skipped.
fn parse_section(text: &str, section: &'static str) -> Result<Vec<(String, String)>, RenderError> {
    let mut lines = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| {
            let t = l.trim();
            !t.is_empty() && !t.starts_with('#') && !t.starts_with(';')
        });

    match lines.next() {
        Some(header) if header.trim() == format!("[{section}]") => {}
        _ => return Err(RenderError::MissingSection(section)),
    }

    let mut entries: Vec<(String, String)> = Vec::new();
    for line in lines {
        if line.starts_with('\t') || line.starts_with(' ') {
            if let Some((_, value)) = entries.last_mut() {
                value.push_str(line.trim());
                continue;
            }
        }
        match line.split_once('=') {
            Some((key, value)) => entries.push((key.trim().to_string(), value.to_string())),
            None => return Err(RenderError::UnknownKey(line.trim().to_string())),
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_controller() -> ControllerConfig {
        ControllerConfig {
            allowed_node_names: vec!["node1".to_string(), "node2".to_string()],
            manager_port: Some(842),
            log_level: Some("DEBUG".to_string()),
            log_target: Some("journald".to_string()),
            log_is_quiet: Some(false),
        }
    }

    fn full_agent() -> AgentConfig {
        AgentConfig {
            manager_address: Some("tcp:host=192.168.1.1,port=842".to_string()),
            heartbeat_interval: Some(2000),
            log_level: Some("INFO".to_string()),
            log_target: Some("stderr".to_string()),
            log_is_quiet: Some(true),
            ..AgentConfig::new("node1", "192.168.1.1", 842)
        }
    }

    fn keys(text: &str) -> Vec<&str> {
        text.lines()
            .filter_map(|l| l.split_once('=').map(|(k, _)| k))
            .collect()
    }

    #[test]
    fn test_render_controller_full() {
        assert_eq!(
            full_controller().render(),
            "[bluechi-controller]\n\
             AllowedNodeNames=node1,\n\tnode2\n\
             ManagerPort=842\n\
             LogLevel=DEBUG\n\
             LogTarget=journald\n\
             LogIsQuiet=false\n"
        );
    }

    #[test]
    fn test_render_controller_minimal() {
        let config = ControllerConfig {
            allowed_node_names: vec!["only".to_string()],
            ..Default::default()
        };
        assert_eq!(
            config.render(),
            "[bluechi-controller]\nAllowedNodeNames=only\n"
        );
    }

    #[test]
    fn test_render_controller_absent_fields_omitted() {
        let config = ControllerConfig {
            allowed_node_names: vec!["a".to_string()],
            log_target: Some("journald".to_string()),
            ..Default::default()
        };
        let text = config.render();
        assert_eq!(keys(&text), vec!["AllowedNodeNames", "LogTarget"]);
        assert!(!text.contains("ManagerPort"));
        assert!(!text.contains("LogIsQuiet"));
    }

    #[test]
    fn test_render_controller_fields_once_in_order() {
        let text = full_controller().render();
        assert_eq!(
            keys(&text),
            vec![
                "AllowedNodeNames",
                "ManagerPort",
                "LogLevel",
                "LogTarget",
                "LogIsQuiet"
            ]
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(full_controller().render(), full_controller().render());
        assert_eq!(full_agent().render(), full_agent().render());
    }

    #[test]
    fn test_render_agent_required_only() {
        let config = AgentConfig::new("node1", "ctrl.example.com", 842);
        assert_eq!(
            config.render(),
            "[bluechi-agent]\nNodeName=node1\nManagerHost=ctrl.example.com\nManagerPort=842\n"
        );
    }

    #[test]
    fn test_render_agent_full_order() {
        let text = full_agent().render();
        assert_eq!(
            keys(&text),
            vec![
                "NodeName",
                "ManagerHost",
                "ManagerPort",
                "ManagerAddress",
                "HeartbeatInterval",
                "LogLevel",
                "LogTarget",
                "LogIsQuiet"
            ]
        );
        assert!(text.contains("HeartbeatInterval=2000\n"));
        assert!(text.contains("LogIsQuiet=true\n"));
    }

    #[test]
    fn test_render_agent_keeps_empty_required_values() {
        let text = AgentConfig::new("", "", 0).render();
        assert!(text.contains("NodeName=\n"));
        assert!(text.contains("ManagerHost=\n"));
        assert!(text.contains("ManagerPort=0\n"));
    }

    #[test]
    fn test_controller_round_trip() {
        let config = full_controller();
        assert_eq!(ControllerConfig::parse(&config.render()).unwrap(), config);

        let minimal = ControllerConfig {
            allowed_node_names: vec![],
            ..Default::default()
        };
        assert_eq!(ControllerConfig::parse(&minimal.render()).unwrap(), minimal);
    }

    #[test]
    fn test_parse_normalises_node_names() {
        let config = ControllerConfig {
            allowed_node_names: vec!["a".to_string(), String::new(), " b".to_string()],
            ..Default::default()
        };
        let parsed = ControllerConfig::parse(&config.render()).unwrap();
        assert_eq!(parsed.allowed_node_names, vec!["a", "b"]);
    }

    #[test]
    fn test_agent_round_trip() {
        let config = full_agent();
        assert_eq!(AgentConfig::parse(&config.render()).unwrap(), config);

        let minimal = AgentConfig::new("n", "h", 1);
        assert_eq!(AgentConfig::parse(&minimal.render()).unwrap(), minimal);
    }

    #[test]
    fn test_parse_wrong_section() {
        let err = AgentConfig::parse(&full_controller().render()).unwrap_err();
        assert_eq!(err, RenderError::MissingSection(AGENT_SECTION));
    }

    #[test]
    fn test_parse_agent_missing_required() {
        let err = AgentConfig::parse("[bluechi-agent]\nNodeName=n\nManagerPort=1\n").unwrap_err();
        assert_eq!(err, RenderError::MissingField("ManagerHost"));
    }

    #[test]
    fn test_parse_invalid_port() {
        let err = AgentConfig::parse("[bluechi-agent]\nNodeName=n\nManagerHost=h\nManagerPort=abc\n")
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidValue { .. }));
    }

    #[test]
    fn test_parse_unknown_key() {
        let err = ControllerConfig::parse("[bluechi-controller]\nAllowedNodeNames=a\nFoo=bar\n")
            .unwrap_err();
        assert_eq!(err, RenderError::UnknownKey("Foo".to_string()));
    }

    #[test]
    fn test_deserialize_controller_from_json() {
        let json = r#"{"allowed_node_names": ["a", "b"], "manager_port": 842}"#;
        let config: ControllerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.allowed_node_names, vec!["a", "b"]);
        assert_eq!(config.manager_port, Some(842));
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_deserialize_agent_requires_node_name() {
        let json = r#"{"manager_host": "h", "manager_port": 842}"#;
        assert!(serde_json::from_str::<AgentConfig>(json).is_err());
    }
}
