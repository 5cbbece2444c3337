use psh_core::config::{HostKeyPolicy, SessionConfig};
use psh_core::error::ExecutionError;
use psh_core::request::Permission;
use psh_core::target::Target;
use psh_core::transport::{Connection, Connector, CONNECT_TIMEOUT_SECS};
use ssh2::{Channel, CheckResult, KnownHostFileKind, Session};
use std::io::{ErrorKind, Read};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info};

/// SSH connector: public-key auth, bounded dial, one session per target.
pub struct SshConnector {
    config: SessionConfig,
    connect_timeout: Duration,
}

impl SshConnector {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Read the private key and reject anything that is obviously not one.
    pub fn load_key(&self) -> Result<String, ExecutionError> {
        let path = &self.config.private_key;
        let key = std::fs::read_to_string(path).map_err(|e| {
            ExecutionError::Config(format!(
                "failed to read private key from {}: {}",
                path.display(),
                e
            ))
        })?;
        validate_key(&key)?;
        Ok(key)
    }
}

fn validate_key(key: &str) -> Result<(), ExecutionError> {
    let trimmed = key.trim();
    if !(trimmed.starts_with("-----BEGIN ") && trimmed.contains("PRIVATE KEY-----")) {
        return Err(ExecutionError::Config(
            "failed to parse private key: no PEM private key block found".into(),
        ));
    }
    if trimmed.contains("ENCRYPTED") {
        return Err(ExecutionError::Config(
            "failed to parse private key: passphrase-protected keys are not supported".into(),
        ));
    }
    Ok(())
}

struct Dial {
    addr: String,
    host: String,
    port: u16,
    user: String,
    key: String,
    policy: HostKeyPolicy,
}

/// Establish an authenticated SSH session. Runs on the dial thread.
fn connect(dial: Dial) -> Result<Session, ExecutionError> {
    debug!("Connecting to {}@{}", dial.user, dial.addr);
    let tcp = TcpStream::connect(&dial.addr).map_err(|e| {
        ExecutionError::Connection(format!("TCP connect to {}: {}", dial.addr, e))
    })?;

    let mut sess = Session::new()
        .map_err(|e| ExecutionError::Connection(format!("Session::new: {}", e)))?;
    sess.set_tcp_stream(tcp);
    sess.handshake()
        .map_err(|e| ExecutionError::Connection(format!("Handshake with {}: {}", dial.addr, e)))?;

    if dial.policy == HostKeyPolicy::KnownHosts {
        verify_host_key(&sess, &dial.host, dial.port)?;
    }

    sess.userauth_pubkey_memory(&dial.user, None, &dial.key, None)
        .map_err(|e| ExecutionError::Connection(format!("Pubkey auth: {}", e)))?;

    if !sess.authenticated() {
        return Err(ExecutionError::Connection("Authentication failed".into()));
    }

    info!("SSH connected to {}@{}", dial.user, dial.addr);
    Ok(sess)
}

fn known_hosts_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/"))
        .join(".ssh")
        .join("known_hosts")
}

fn verify_host_key(sess: &Session, host: &str, port: u16) -> Result<(), ExecutionError> {
    let mut known = sess
        .known_hosts()
        .map_err(|e| ExecutionError::Connection(format!("known_hosts: {}", e)))?;
    let path = known_hosts_path();
    known
        .read_file(&path, KnownHostFileKind::OpenSSH)
        .map_err(|e| ExecutionError::Connection(format!("read {}: {}", path.display(), e)))?;

    let (key, _) = sess
        .host_key()
        .ok_or_else(|| ExecutionError::Connection(format!("{} sent no host key", host)))?;

    match known.check_port(host, port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::Mismatch => Err(ExecutionError::Connection(format!(
            "host key for {} does not match {}",
            host,
            path.display()
        ))),
        CheckResult::NotFound => Err(ExecutionError::Connection(format!(
            "host {} not found in {}",
            host,
            path.display()
        ))),
        CheckResult::Failure => Err(ExecutionError::Connection(format!(
            "host key check for {} failed",
            host
        ))),
    }
}

impl Connector for SshConnector {
    fn open(&self, target: &Target) -> Result<Box<dyn Connection>, ExecutionError> {
        let key = self.load_key()?;
        let addr = format!("{}:{}", target.ip, self.config.port);
        let dial = Dial {
            addr: addr.clone(),
            host: target.ip.clone(),
            port: self.config.port,
            user: self.config.user.clone(),
            key,
            policy: self.config.host_key_policy,
        };

        // A dial that outlives the timeout finishes on its own thread and
        // its session is dropped when the send fails.
        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name(format!("dial-{}", addr))
            .spawn(move || {
                let _ = tx.send(connect(dial));
            })
            .map_err(|e| ExecutionError::Connection(format!("spawn dial thread: {}", e)))?;

        match rx.recv_timeout(self.connect_timeout) {
            Ok(Ok(sess)) => Ok(Box::new(SshConnection { sess, addr })),
            Ok(Err(e)) => Err(e),
            Err(RecvTimeoutError::Timeout) => Err(ExecutionError::ConnectTimeout {
                addr,
                timeout: self.connect_timeout,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(ExecutionError::Connection(format!(
                "dial to {} ended without a result",
                addr
            ))),
        }
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Drain stdout and stderr until the remote closes stdout. Both streams share
/// the channel window, so they are read side by side in non-blocking mode.
fn read_streams(sess: &Session, channel: &mut Channel) -> std::io::Result<(Vec<u8>, Vec<u8>)> {
    sess.set_blocking(false);
    let pumped = pump(channel);
    sess.set_blocking(true);
    let (mut stdout, mut stderr) = pumped?;

    // Whatever arrived alongside EOF is already buffered locally.
    channel.read_to_end(&mut stdout)?;
    channel.stderr().read_to_end(&mut stderr)?;
    Ok((stdout, stderr))
}

fn pump(channel: &mut Channel) -> std::io::Result<(Vec<u8>, Vec<u8>)> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut buf = [0u8; 8192];
    while !channel.eof() {
        let mut progressed = read_available(&mut channel.stream(0), &mut stdout, &mut buf)?;
        progressed |= read_available(&mut channel.stderr(), &mut stderr, &mut buf)?;
        if !progressed {
            std::thread::sleep(POLL_INTERVAL);
        }
    }
    Ok((stdout, stderr))
}

/// One non-blocking read. Returns whether any bytes arrived.
fn read_available(
    stream: &mut impl Read,
    sink: &mut Vec<u8>,
    buf: &mut [u8],
) -> std::io::Result<bool> {
    match stream.read(buf) {
        Ok(0) => Ok(false),
        Ok(n) => {
            sink.extend_from_slice(&buf[..n]);
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(false),
        Err(e) => Err(e),
    }
}

/// Remote output is raw bytes; invalid UTF-8 is replaced, never an error.
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

fn transfer_error(e: impl std::fmt::Display) -> ExecutionError {
    ExecutionError::Transfer(e.to_string())
}

/// An open SSH session. Each call gets its own channel.
pub struct SshConnection {
    sess: Session,
    addr: String,
}

impl Connection for SshConnection {
    fn exec(&mut self, command: &str) -> Result<String, ExecutionError> {
        let fail = |reason: String| ExecutionError::RemoteCommand {
            command: command.to_string(),
            reason,
        };

        let mut channel = self
            .sess
            .channel_session()
            .map_err(|e| fail(format!("failed to create session: {}", e)))?;
        channel
            .exec(command)
            .map_err(|e| fail(format!("exec: {}", e)))?;

        let (stdout, stderr) = read_streams(&self.sess, &mut channel)
            .map_err(|e| fail(format!("read output: {}", e)))?;
        let output = decode(stdout);
        let stderr = decode(stderr);

        channel
            .wait_close()
            .map_err(|e| fail(format!("close channel: {}", e)))?;
        let exit_status = channel
            .exit_status()
            .map_err(|e| fail(format!("exit status: {}", e)))?;

        if exit_status != 0 {
            let stderr = stderr.trim();
            return Err(fail(if stderr.is_empty() {
                format!("process exited with status {}", exit_status)
            } else {
                format!("process exited with status {}: {}", exit_status, stderr)
            }));
        }

        Ok(output)
    }

    fn send_file(
        &mut self,
        source: &mut dyn Read,
        size: u64,
        dest: &str,
        permission: Permission,
    ) -> Result<(), ExecutionError> {
        debug!("scp {} bytes to {}:{} ({})", size, self.addr, dest, permission);
        let mut remote = self
            .sess
            .scp_send(Path::new(dest), permission.mode() as i32, size, None)
            .map_err(transfer_error)?;
        std::io::copy(source, &mut remote).map_err(transfer_error)?;

        remote.send_eof().map_err(transfer_error)?;
        remote.wait_eof().map_err(transfer_error)?;
        remote.close().map_err(transfer_error)?;
        remote.wait_close().map_err(transfer_error)?;
        Ok(())
    }

    fn close(self: Box<Self>) {
        debug!("Closing SSH session to {}", self.addr);
        let _ = self.sess.disconnect(None, "psh done", None);
    }
}
