//! In-memory remote shell for tests

use std::cell::RefCell;
use std::rc::Rc;

use super::endpoint::RemoteEndpoint;
use super::error::ClientError;
use super::transport::{CommandOutput, Connector, RemoteShell, TransportOptions};

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    output: CommandOutput,
}

/// Answers commands from a script and records every command it sees
///
/// A rule matches when the command equals its pattern, or failing that,
/// contains it. Unmatched commands succeed with empty output.
#[derive(Debug, Clone, Default)]
pub struct ScriptedShell {
    rules: Vec<Rule>,
    log: Rc<RefCell<Vec<String>>>,
    closed: Rc<RefCell<bool>>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, pattern: &str, exit_status: i32, stdout: &str) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            output: CommandOutput {
                exit_status,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        });
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl RemoteShell for ScriptedShell {
    fn exec(&mut self, command: &str) -> Result<CommandOutput, ClientError> {
        self.log.borrow_mut().push(command.to_string());

        let rule = self
            .rules
            .iter()
            .find(|r| r.pattern == command)
            .or_else(|| self.rules.iter().find(|r| command.contains(&r.pattern)));

        Ok(rule.map(|r| r.output.clone()).unwrap_or_default())
    }

    fn close(&mut self) -> Result<(), ClientError> {
        *self.closed.borrow_mut() = true;
        Ok(())
    }
}

/// Hands out clones of one scripted shell
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    shell: ScriptedShell,
    refuse: Option<String>,
}

impl ScriptedConnector {
    pub fn new(shell: ScriptedShell) -> Self {
        Self {
            shell,
            refuse: None,
        }
    }

    /// Make every connect attempt fail with a network error
    pub fn refusing(reason: &str) -> Self {
        Self {
            shell: ScriptedShell::new(),
            refuse: Some(reason.to_string()),
        }
    }
}

impl Connector for ScriptedConnector {
    type Shell = ScriptedShell;

    fn connect(
        &self,
        _endpoint: &RemoteEndpoint,
        _options: &TransportOptions,
    ) -> Result<ScriptedShell, ClientError> {
        match &self.refuse {
            Some(reason) => Err(ClientError::Network(reason.clone())),
            None => Ok(self.shell.clone()),
        }
    }
}
