//! SSH session transport
//!
//! Owns one authenticated SSH connection and runs commands on it, one
//! short-lived exec channel per command.

use std::io::Read;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ssh2::{Channel, CheckResult, ErrorCode, KnownHostFileKind, Session};

use super::endpoint::RemoteEndpoint;
use super::error::ClientError;

/// Prefix for commands that need root when the login user is not root
pub const SUDO_PREFIX: &str = "sudo -n";

/// libssh2's LIBSSH2_ERROR_TIMEOUT
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;

const READ_CHUNK: usize = 8192;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Result of one remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }

    /// stdout and stderr joined, for error reports
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim_end();
        let stderr = self.stderr.trim_end();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.to_string(),
            (_, true) => stdout.to_string(),
            _ => format!("{stdout}\n{stderr}"),
        }
    }
}

/// A remote shell commands can be executed on
pub trait RemoteShell {
    /// Run one command to completion and collect its output
    fn exec(&mut self, command: &str) -> Result<CommandOutput, ClientError>;

    /// Close the underlying connection
    fn close(&mut self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Transport-level options that apply to every session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportOptions {
    /// known_hosts file, defaults to ~/.ssh/known_hosts
    pub known_hosts_path: Option<PathBuf>,
    /// Per-command timeout, `None` blocks until the command finishes
    pub command_timeout: Option<Duration>,
}

/// Opens remote shells for an endpoint
pub trait Connector {
    type Shell: RemoteShell;

    fn connect(
        &self,
        endpoint: &RemoteEndpoint,
        options: &TransportOptions,
    ) -> Result<Self::Shell, ClientError>;
}

/// Connector backed by libssh2
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

impl Connector for SshConnector {
    type Shell = SshSession;

    fn connect(
        &self,
        endpoint: &RemoteEndpoint,
        options: &TransportOptions,
    ) -> Result<SshSession, ClientError> {
        SshSession::connect(endpoint, options)
    }
}

/// Authentication methods offered to the server, in preference order
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMethod {
    PrivateKey(PathBuf),
    Password(String),
}

/// Build the auth method list from whichever credentials are set
///
/// The private key comes first; both are offered when both are set.
pub fn auth_methods(endpoint: &RemoteEndpoint) -> Result<Vec<AuthMethod>, ClientError> {
    let mut methods = Vec::new();

    if let Some(path) = endpoint.private_key()? {
        std::fs::metadata(&path).map_err(|e| ClientError::KeyRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        methods.push(AuthMethod::PrivateKey(path));
    }

    if let Some(password) = endpoint.password() {
        methods.push(AuthMethod::Password(password.to_string()));
    }

    Ok(methods)
}

/// An authenticated SSH connection
pub struct SshSession {
    session: Session,
    command_timeout: Option<Duration>,
}

impl SshSession {
    /// Dial, verify the host key and authenticate
    pub fn connect(
        endpoint: &RemoteEndpoint,
        options: &TransportOptions,
    ) -> Result<Self, ClientError> {
        let (hostname, port) = endpoint.target();
        let methods = auth_methods(endpoint)?;

        tracing::debug!("Connecting to {}@{}:{}", endpoint.user, hostname, port);

        let tcp = TcpStream::connect((hostname.as_str(), port))
            .map_err(|e| ClientError::Network(format!("{hostname}:{port}: {e}")))?;

        let mut session = Session::new().map_err(|e| ClientError::Network(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| ClientError::Network(format!("SSH handshake with {hostname}: {e}")))?;

        match host_key_check(endpoint, options)? {
            HostKeyCheck::Skip => {
                tracing::debug!("Skipping host key verification for {}", hostname);
            }
            HostKeyCheck::KnownHosts(path) => verify_host_key(&session, &hostname, port, &path)?,
        }

        authenticate(&session, &endpoint.user, &methods)?;

        if let Some(timeout) = options.command_timeout {
            let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
            session.set_timeout(millis);
        }

        tracing::debug!("SSH session established to {}", hostname);

        Ok(Self {
            session,
            command_timeout: options.command_timeout,
        })
    }

    /// Read stdout and stderr until the remote side closes both
    ///
    /// The two streams are polled together in non-blocking mode; a full
    /// stderr window must never block the stdout read.
    fn drain(&self, channel: &mut Channel, command: &str) -> Result<(String, String), ClientError> {
        self.session.set_blocking(false);
        let result = self.drain_nonblocking(channel, command);
        self.session.set_blocking(true);
        result
    }

    fn drain_nonblocking(
        &self,
        channel: &mut Channel,
        command: &str,
    ) -> Result<(String, String), ClientError> {
        let deadline = self.command_timeout.map(|after| (Instant::now() + after, after));
        let mut stderr_stream = channel.stderr();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            let eof = channel.eof();
            let progressed = read_available(channel, &mut stdout, &mut buf)
                .map_err(|e| io_error(command, e, self.command_timeout))?
                | read_available(&mut stderr_stream, &mut stderr, &mut buf)
                    .map_err(|e| io_error(command, e, self.command_timeout))?;

            if eof && !progressed {
                break;
            }
            if !progressed {
                if let Some((at, after)) = deadline {
                    if Instant::now() >= at {
                        return Err(ClientError::Timeout {
                            command: command.to_string(),
                            after,
                        });
                    }
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }

        Ok((
            String::from_utf8_lossy(&stdout).into_owned(),
            String::from_utf8_lossy(&stderr).into_owned(),
        ))
    }
}

/// Append everything `reader` has ready to `sink`
///
/// Returns whether any bytes were read. `WouldBlock` means nothing more is
/// ready right now; end of stream reads as zero bytes.
fn read_available<R: Read>(
    reader: &mut R,
    sink: &mut Vec<u8>,
    buf: &mut [u8],
) -> std::io::Result<bool> {
    let mut progressed = false;
    loop {
        match reader.read(buf) {
            Ok(0) => return Ok(progressed),
            Ok(n) => {
                sink.extend_from_slice(&buf[..n]);
                progressed = true;
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(progressed),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

/// Map a libssh2 error, turning its timeout code into `Timeout` when a timeout is set
fn ssh_error(command: &str, err: ssh2::Error, timeout: Option<Duration>) -> ClientError {
    match timeout {
        Some(after) if matches!(err.code(), ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT)) => {
            ClientError::Timeout {
                command: command.to_string(),
                after,
            }
        }
        _ => ClientError::channel("run remote command", command, err),
    }
}

/// Map a channel read error, turning `TimedOut` into `Timeout` when a timeout is set
fn io_error(command: &str, err: std::io::Error, timeout: Option<Duration>) -> ClientError {
    match timeout {
        Some(after) if err.kind() == std::io::ErrorKind::TimedOut => ClientError::Timeout {
            command: command.to_string(),
            after,
        },
        _ => ClientError::channel("read remote command output", command, err),
    }
}

impl RemoteShell for SshSession {
    fn exec(&mut self, command: &str) -> Result<CommandOutput, ClientError> {
        let timeout = self.command_timeout;
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| ssh_error(command, e, timeout))?;

        channel
            .exec(command)
            .map_err(|e| ssh_error(command, e, timeout))?;

        let (stdout, stderr) = self.drain(&mut channel, command)?;

        channel
            .wait_close()
            .map_err(|e| ssh_error(command, e, timeout))?;
        let exit_status = channel
            .exit_status()
            .map_err(|e| ssh_error(command, e, timeout))?;

        Ok(CommandOutput {
            exit_status,
            stdout,
            stderr,
        })
    }

    fn close(&mut self) -> Result<(), ClientError> {
        self.session
            .disconnect(None, "bluechi-provision disconnect", None)
            .map_err(|e| ClientError::Network(format!("disconnect failed: {e}")))
    }
}

/// ~/.ssh/known_hosts
pub fn default_known_hosts_path() -> Result<PathBuf, ClientError> {
    dirs::home_dir()
        .map(|home| home.join(".ssh").join("known_hosts"))
        .ok_or_else(|| ClientError::HostKey("could not determine home directory".to_string()))
}

/// How the server's host key is to be treated
#[derive(Debug, Clone, PartialEq)]
pub enum HostKeyCheck {
    /// Accept whatever key the server presents
    Skip,
    /// Require a matching entry in this known_hosts file
    KnownHosts(PathBuf),
}

/// Pick the host key check for an endpoint
pub fn host_key_check(
    endpoint: &RemoteEndpoint,
    options: &TransportOptions,
) -> Result<HostKeyCheck, ClientError> {
    if endpoint.accept_host_key_insecure {
        return Ok(HostKeyCheck::Skip);
    }
    let path = match &options.known_hosts_path {
        Some(path) => path.clone(),
        None => default_known_hosts_path()?,
    };
    Ok(HostKeyCheck::KnownHosts(path))
}

fn verify_host_key(
    session: &Session,
    hostname: &str,
    port: u16,
    known_hosts_path: &Path,
) -> Result<(), ClientError> {
    let mut known_hosts = session
        .known_hosts()
        .map_err(|e| ClientError::HostKey(e.to_string()))?;

    known_hosts
        .read_file(known_hosts_path, KnownHostFileKind::OpenSSH)
        .map_err(|e| {
            ClientError::HostKey(format!(
                "failed to read {}: {}",
                known_hosts_path.display(),
                e
            ))
        })?;

    let (key, _) = session
        .host_key()
        .ok_or_else(|| ClientError::HostKey(format!("{hostname} presented no host key")))?;

    host_key_verdict(
        known_hosts.check_port(hostname, port, key),
        hostname,
        known_hosts_path,
    )
}

/// Turn a known_hosts lookup into a connect result
fn host_key_verdict(
    result: CheckResult,
    hostname: &str,
    known_hosts_path: &Path,
) -> Result<(), ClientError> {
    match result {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err(ClientError::HostKey(format!(
            "{hostname} is not in {}",
            known_hosts_path.display()
        ))),
        CheckResult::Mismatch => Err(ClientError::HostKey(format!(
            "host key for {hostname} does not match {}",
            known_hosts_path.display()
        ))),
        CheckResult::Failure => Err(ClientError::HostKey(format!(
            "could not check host key for {hostname}"
        ))),
    }
}

fn authenticate(session: &Session, user: &str, methods: &[AuthMethod]) -> Result<(), ClientError> {
    if methods.is_empty() {
        return Err(ClientError::Auth {
            user: user.to_string(),
            reason: "no private key or password configured".to_string(),
        });
    }

    let mut last_error = String::new();
    for method in methods {
        let result = match method {
            AuthMethod::PrivateKey(path) => session.userauth_pubkey_file(user, None, path, None),
            AuthMethod::Password(password) => session.userauth_password(user, password),
        };
        match result {
            Ok(()) if session.authenticated() => return Ok(()),
            Ok(()) => {}
            Err(e) => {
                tracing::debug!("SSH auth method rejected: {}", e);
                last_error = e.to_string();
            }
        }
    }

    Err(ClientError::Auth {
        user: user.to_string(),
        reason: last_error,
    })
}

/// A live session plus the privilege level of the login user
///
/// `has_root` is determined once, when the connection is established.
pub struct Connection<S: RemoteShell> {
    shell: S,
    has_root: bool,
}

impl<S: RemoteShell> Connection<S> {
    /// Wrap a fresh shell and cache whether it runs as root
    pub fn establish(mut shell: S) -> Result<Self, ClientError> {
        let output = shell.exec("whoami")?;
        if !output.success() {
            return Err(ClientError::RemoteExec {
                context: "determine if root".to_string(),
                command: "whoami".to_string(),
                exit_status: Some(output.exit_status),
                output: output.combined(),
            });
        }

        let has_root = output.stdout.trim() == "root";
        tracing::debug!("Remote user is root: {}", has_root);

        Ok(Self { shell, has_root })
    }

    pub fn has_root(&self) -> bool {
        self.has_root
    }

    /// Prefix a command with sudo unless already root
    pub fn privileged(&self, command: &str) -> String {
        if self.has_root {
            command.to_string()
        } else {
            format!("{SUDO_PREFIX} {command}")
        }
    }

    /// Run a command, returning its output whatever the exit status
    pub fn exec(&mut self, command: &str) -> Result<CommandOutput, ClientError> {
        tracing::debug!("Running remote command: {}", command);
        self.shell.exec(command)
    }

    /// Run a command and turn a non-zero exit into `RemoteExec`
    pub fn exec_checked(&mut self, context: &str, command: &str) -> Result<String, ClientError> {
        let output = self.exec(command)?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(ClientError::RemoteExec {
                context: context.to_string(),
                command: command.to_string(),
                exit_status: Some(output.exit_status),
                output: output.combined(),
            })
        }
    }

    /// Close the underlying shell
    pub fn close(mut self) -> Result<(), ClientError> {
        self.shell.close()
    }
}
