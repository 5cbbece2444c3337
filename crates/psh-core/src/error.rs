use std::time::Duration;
use thiserror::Error;

/// Failure of one target's pipeline. Never escapes that target's branch.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("failed to get ssh config: {0}")]
    Config(String),

    #[error("ssh connection failed: {0}")]
    Connection(String),

    #[error("ssh connection to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("failed to run command '{command}': {reason}")]
    RemoteCommand { command: String, reason: String },

    #[error("unexpected output: {0}")]
    ProbeProtocol(String),

    #[error("{0}")]
    Precondition(String),

    #[error("error while copying file: {0}")]
    Transfer(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("failed to open file {path}: {source}")]
    LocalFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("task for {0} panicked or was cancelled")]
    Aborted(String),

    /// A failure inside one step of a multi-step pipeline.
    #[error("{context}: {source}")]
    Step {
        context: String,
        #[source]
        source: Box<ExecutionError>,
    },
}

impl ExecutionError {
    /// Wrap this error with the pipeline step it came from.
    pub fn in_step(self, context: impl Into<String>) -> Self {
        ExecutionError::Step {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, beneath any step context.
    pub fn root(&self) -> &ExecutionError {
        match self {
            ExecutionError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for both dial failures and dial timeouts.
    pub fn is_connection(&self) -> bool {
        matches!(
            self.root(),
            ExecutionError::Connection(_) | ExecutionError::ConnectTimeout { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), ExecutionError::ConnectTimeout { .. })
    }
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("ipType is invalid: {0}")]
    InvalidIpClass(String),

    #[error("no targets found")]
    NoTargets,

    #[error("unable to read inventory {path}: {reason}")]
    Inventory { path: String, reason: String },
}
