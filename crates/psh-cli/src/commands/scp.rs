use crate::dispatch;
use crate::{SessionArgs, TargetArgs};
use psh_core::config::Config;
use psh_core::request::{ExecutionRequest, Permission, TransferOptions, TransferRequest};
use std::path::PathBuf;

pub struct ScpOptions {
    pub source: PathBuf,
    pub dest: String,
    pub permission: String,
    pub decompress: bool,
    pub create_dir: bool,
}

pub async fn run(
    config: &Config,
    targets: &TargetArgs,
    session: &SessionArgs,
    options: ScpOptions,
) -> anyhow::Result<bool> {
    if options.dest.trim().is_empty() {
        anyhow::bail!("--dest must not be empty");
    }
    let permission: Permission = options
        .permission
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let request = TransferRequest {
        source: options.source,
        dest: options.dest,
        permission,
        options: TransferOptions {
            decompress: options.decompress,
            create_dir: options.create_dir,
        },
    };

    dispatch::run_request(config, targets, session, ExecutionRequest::Transfer(request)).await
}
