use std::sync::Arc;
use tokio::sync::oneshot;

use crate::command::CommandExecutor;
use crate::error::ExecutionError;
use crate::request::{ExecutionRequest, TransferRequest};
use crate::target::Target;
use crate::transfer::TransferExecutor;

/// The per-target unit of work the dispatcher fans out.
#[async_trait::async_trait]
pub trait Action: Send + Sync {
    /// One-line description for previews and logs.
    fn describe(&self) -> String;

    /// Perform the action against one target and return its transcript.
    async fn execute(&self, target: &Target) -> Result<String, ExecutionError>;
}

/// Run blocking transport work on a dedicated OS thread, so every target is
/// in flight at once however many there are.
async fn on_own_thread<F>(target: &Target, work: F) -> Result<String, ExecutionError>
where
    F: FnOnce() -> Result<String, ExecutionError> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name(format!("psh-{}", target.ip))
        .spawn(move || {
            let _ = tx.send(work());
        })
        .map_err(|e| {
            ExecutionError::Aborted(target.ip.clone())
                .in_step(format!("failed to spawn worker thread: {}", e))
        })?;

    // A panicking worker drops the sender without sending.
    rx.await
        .map_err(|_| ExecutionError::Aborted(target.ip.clone()))?
}

/// Runs a shell command with the header block.
pub struct CommandAction {
    executor: CommandExecutor,
    command: String,
}

impl CommandAction {
    pub fn new(executor: CommandExecutor, command: impl Into<String>) -> Self {
        Self {
            executor,
            command: command.into(),
        }
    }
}

#[async_trait::async_trait]
impl Action for CommandAction {
    fn describe(&self) -> String {
        format!("Command: {}", self.command)
    }

    async fn execute(&self, target: &Target) -> Result<String, ExecutionError> {
        let executor = self.executor.clone();
        let command = self.command.clone();
        let owned = target.clone();
        on_own_thread(target, move || executor.run(&owned, &command, true)).await
    }
}

pub struct TransferAction {
    executor: TransferExecutor,
    request: Arc<TransferRequest>,
}

impl TransferAction {
    pub fn new(executor: TransferExecutor, request: TransferRequest) -> Self {
        Self {
            executor,
            request: Arc::new(request),
        }
    }
}

#[async_trait::async_trait]
impl Action for TransferAction {
    fn describe(&self) -> String {
        let mut desc = format!(
            "Source: {} / Destination: {} / Permission: {}",
            self.request.source.display(),
            self.request.dest,
            self.request.permission
        );
        if self.request.options.decompress {
            desc.push_str(" / Decompression: Enabled");
        }
        if self.request.options.create_dir {
            desc.push_str(" / Directory Creation: Enabled");
        }
        desc
    }

    async fn execute(&self, target: &Target) -> Result<String, ExecutionError> {
        let executor = self.executor.clone();
        let request = Arc::clone(&self.request);
        let owned = target.clone();
        on_own_thread(target, move || executor.transfer(&owned, &request)).await
    }
}

/// Bind a request to the executor that performs it.
pub fn bind(request: ExecutionRequest, commands: CommandExecutor) -> Arc<dyn Action> {
    match request {
        ExecutionRequest::Command { command } => Arc::new(CommandAction::new(commands, command)),
        ExecutionRequest::Transfer(transfer) => Arc::new(TransferAction::new(
            TransferExecutor::new(commands),
            transfer,
        )),
    }
}
