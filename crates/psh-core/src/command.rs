use chrono::Local;
use std::sync::Arc;
use tracing::debug;

use crate::audit::AuditSink;
use crate::error::ExecutionError;
use crate::header::command_header;
use crate::target::Target;
use crate::transport::{Connection, Connector};

/// Runs one command on one target and formats what it printed.
#[derive(Clone)]
pub struct CommandExecutor {
    connector: Arc<dyn Connector>,
    audit: Arc<dyn AuditSink>,
}

impl CommandExecutor {
    pub fn new(connector: Arc<dyn Connector>, audit: Arc<dyn AuditSink>) -> Self {
        Self { connector, audit }
    }

    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    /// Open a connection, run `command`, close the connection.
    pub fn run(
        &self,
        target: &Target,
        command: &str,
        display_header: bool,
    ) -> Result<String, ExecutionError> {
        let result = self.connector.open(target).and_then(|mut conn| {
            let output = execute(conn.as_mut(), target, command, display_header);
            conn.close();
            output
        });
        self.audit.record(target, command, result.as_ref().err());
        result
    }

    /// Run `command` on a connection the caller already holds.
    pub fn run_on(
        &self,
        conn: &mut dyn Connection,
        target: &Target,
        command: &str,
        display_header: bool,
    ) -> Result<String, ExecutionError> {
        let result = execute(conn, target, command, display_header);
        self.audit.record(target, command, result.as_ref().err());
        result
    }
}

fn execute(
    conn: &mut dyn Connection,
    target: &Target,
    command: &str,
    display_header: bool,
) -> Result<String, ExecutionError> {
    debug!("Remote exec on {}: {}", target.ip, command);
    let stdout = conn.exec(command)?;

    let mut output = String::new();
    if display_header {
        output.push_str(&command_header(target, command, &Local::now()));
    }
    output.push_str(&stdout);
    output.push('\n');
    Ok(output)
}
