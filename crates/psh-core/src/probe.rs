//! Read-only questions about remote state, answered by running a diagnostic
//! command and classifying what it prints. Probe output never reaches the
//! transcript.

use crate::command::CommandExecutor;
use crate::error::ExecutionError;
use crate::target::Target;
use crate::transport::Connection;

pub fn directory_probe_command(path: &str) -> String {
    format!("[ -d '{}' ] && echo 'exists' || echo 'not exists'", path)
}

pub fn command_probe_command(tool: &str) -> String {
    format!("command -v {}", tool)
}

/// Strict two-valued reading of the directory probe.
pub fn classify_directory_probe(output: &str) -> Result<bool, ExecutionError> {
    match output.trim() {
        "exists" => Ok(true),
        "not exists" => Ok(false),
        other => Err(ExecutionError::ProbeProtocol(other.to_string())),
    }
}

pub fn directory_exists(
    commands: &CommandExecutor,
    conn: &mut dyn Connection,
    target: &Target,
    path: &str,
) -> Result<bool, ExecutionError> {
    let output = commands.run_on(conn, target, &directory_probe_command(path), false)?;
    classify_directory_probe(&output)
}

/// Whether `tool` is on the remote PATH. A probe that fails to run counts
/// as "not available".
pub fn command_available(
    commands: &CommandExecutor,
    conn: &mut dyn Connection,
    target: &Target,
    tool: &str,
) -> bool {
    match commands.run_on(conn, target, &command_probe_command(tool), false) {
        Ok(output) => !output.trim().is_empty(),
        Err(_) => false,
    }
}
