use crate::dispatch;
use crate::{SessionArgs, TargetArgs};
use psh_core::config::Config;
use psh_core::request::ExecutionRequest;

pub async fn run(
    config: &Config,
    targets: &TargetArgs,
    session: &SessionArgs,
    command: String,
) -> anyhow::Result<bool> {
    if command.trim().is_empty() {
        anyhow::bail!("--command must not be empty");
    }

    dispatch::run_request(config, targets, session, ExecutionRequest::Command { command }).await
}
