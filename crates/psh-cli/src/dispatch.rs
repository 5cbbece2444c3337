use anyhow::Context;
use psh_core::audit::{AuditSink, JsonlAuditLog, NullAudit};
use psh_core::config::{Config, HostKeyPolicy, SessionConfig};
use psh_core::discovery::{parse_tags, Inventory, TargetSource};
use psh_core::request::ExecutionRequest;
use psh_core::target::{IpClass, TargetSet};
use psh_core::{bind, dispatch, Action, CommandExecutor, StdoutSink};
use psh_ssh::SshConnector;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{SessionArgs, TargetArgs};

pub fn load_config() -> anyhow::Result<Config> {
    Config::load_default()
        .with_context(|| format!("loading {}", Config::default_path().display()))
}

/// Merge flags over the config file into the immutable session settings.
pub fn session_config(config: &Config, args: &SessionArgs) -> SessionConfig {
    let policy = if args.strict_host_key || config.host_key_check {
        HostKeyPolicy::KnownHosts
    } else {
        HostKeyPolicy::Insecure
    };
    SessionConfig::new(
        args.user.as_deref().unwrap_or(&config.user),
        args.private_key.as_deref().unwrap_or(&config.private_key),
        args.port.unwrap_or(config.port),
    )
    .with_host_key_policy(policy)
}

/// Resolve the tag filter against the inventory.
pub fn resolve_targets(config: &Config, args: &TargetArgs) -> anyhow::Result<TargetSet> {
    let ip_class: IpClass = match &args.ip_type {
        Some(raw) => raw.parse()?,
        None => config.ip_type,
    };
    let inventory_path = match &args.inventory {
        Some(p) => psh_core::config::expand_home(p),
        None => config.inventory_path(),
    };

    let inventory = Inventory::load_from(&inventory_path)?;
    let targets = inventory
        .resolve(&parse_tags(&args.tags), ip_class)
        .context("Failed to create target list")?;
    info!("Resolved {} target(s) from {}", targets.len(), inventory_path.display());
    Ok(targets)
}

fn audit_sink(config: &Config) -> Arc<dyn AuditSink> {
    let path = config.audit_log_path();
    match JsonlAuditLog::open(&path) {
        Ok(log) => {
            info!("Audit run {} -> {}", log.run_id(), path.display());
            Arc::new(log)
        }
        Err(e) => {
            warn!("Audit log {} unavailable: {}", path.display(), e);
            Arc::new(NullAudit)
        }
    }
}

fn ask(prompt: &str) -> anyhow::Result<bool> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut response = String::new();
    std::io::stdin().lock().read_line(&mut response)?;
    println!();
    Ok(response.trim().eq_ignore_ascii_case("y"))
}

fn confirm(targets: &TargetSet, action: &dyn Action, untagged: bool) -> anyhow::Result<bool> {
    if untagged
        && !ask("You have not specified any tags. This will run on ALL instances. Do you want to continue? [y/N]: ")?
    {
        return Ok(false);
    }

    println!("Targets:");
    for target in targets.values() {
        println!(
            "Name: {} / ID: {} / IP: {}",
            target.display_name(),
            target.id,
            target.ip
        );
    }
    println!("\n{}", action.describe());
    ask("\nDo you want to continue? [y/N]: ")
}

/// Resolve, confirm, fan out, report. Returns whether every target succeeded.
pub async fn run_request(
    config: &Config,
    target_args: &TargetArgs,
    session_args: &SessionArgs,
    request: ExecutionRequest,
) -> anyhow::Result<bool> {
    let targets = resolve_targets(config, target_args)?;
    let session = session_config(config, session_args);

    let connector = Arc::new(SshConnector::new(session));
    let commands = CommandExecutor::new(connector, audit_sink(config));
    let action = bind(request, commands);

    let untagged = parse_tags(&target_args.tags).is_empty();
    if !session_args.yes && !confirm(&targets, action.as_ref(), untagged)? {
        println!("Aborted.");
        return Ok(true);
    }

    let report = dispatch(&targets, action, Arc::new(StdoutSink)).await;

    for (target, err) in report.sorted_failures() {
        println!("{}: {}", target.ip, err);
    }
    println!("finish");
    info!(
        "{} succeeded, {} failed",
        report.succeeded(),
        report.failures.len()
    );

    Ok(report.is_success())
}
