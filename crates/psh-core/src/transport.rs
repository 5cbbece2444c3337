use std::io::Read;

use crate::error::ExecutionError;
use crate::request::Permission;
use crate::target::Target;

/// Seconds allowed for dial, handshake and authentication together.
pub const CONNECT_TIMEOUT_SECS: u64 = 5;

/// One authenticated connection to one host.
///
/// Every call opens its own channel and closes it before returning, so calls
/// are strictly sequential. The owner must call [`Connection::close`] on every
/// exit path.
pub trait Connection: Send {
    /// Run `command` to completion and return its stdout. A nonzero exit
    /// status is a [`ExecutionError::RemoteCommand`].
    fn exec(&mut self, command: &str) -> Result<String, ExecutionError>;

    /// Stream `size` bytes from `source` into `dest` with the given mode.
    fn send_file(
        &mut self,
        source: &mut dyn Read,
        size: u64,
        dest: &str,
        permission: Permission,
    ) -> Result<(), ExecutionError>;

    /// Release the connection.
    fn close(self: Box<Self>);
}

/// Opens connections. Holds the session configuration, so one instance is
/// shared by every branch of a run.
pub trait Connector: Send + Sync {
    fn open(&self, target: &Target) -> Result<Box<dyn Connection>, ExecutionError>;
}
