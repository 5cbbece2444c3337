//! Fan-out over a target set: one task per target, no cap, one barrier.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::action::Action;
use crate::error::ExecutionError;
use crate::target::{Target, TargetSet};

/// Receives a branch's transcript the moment that branch succeeds.
pub trait OutputSink: Send + Sync {
    fn emit(&self, target: &Target, output: &str);
}

/// Writes each transcript to stdout as one uninterrupted block.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&self, _target: &Target, output: &str) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = lock.write_all(output.as_bytes());
        let _ = lock.flush();
    }
}

/// Outcome of one dispatch, read only after every branch finished.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub attempted: usize,
    pub failures: HashMap<Target, ExecutionError>,
}

impl DispatchReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures ordered by IP for stable reporting.
    pub fn sorted_failures(&self) -> Vec<(&Target, &ExecutionError)> {
        let mut failures: Vec<_> = self.failures.iter().collect();
        failures.sort_by(|a, b| a.0.ip.cmp(&b.0.ip).then_with(|| a.0.id.cmp(&b.0.id)));
        failures
    }
}

type FailureMap = Arc<Mutex<HashMap<Target, ExecutionError>>>;

fn record_failure(failures: &FailureMap, target: Target, error: ExecutionError) {
    let mut map = failures.lock().unwrap_or_else(|e| e.into_inner());
    map.entry(target).or_insert(error);
}

/// Run `action` against every target concurrently and wait for all of them.
pub async fn dispatch(
    targets: &TargetSet,
    action: Arc<dyn Action>,
    sink: Arc<dyn OutputSink>,
) -> DispatchReport {
    let failures: FailureMap = Arc::new(Mutex::new(HashMap::new()));
    let mut handles: Vec<(Target, JoinHandle<()>)> = Vec::with_capacity(targets.len());

    for target in targets.values() {
        let action = Arc::clone(&action);
        let sink = Arc::clone(&sink);
        let failures = Arc::clone(&failures);
        let branch_target = target.clone();

        let handle = tokio::spawn(async move {
            match action.execute(&branch_target).await {
                Ok(output) => sink.emit(&branch_target, &output),
                Err(e) => {
                    warn!("{} failed: {}", branch_target.ip, e);
                    record_failure(&failures, branch_target, e);
                }
            }
        });
        handles.push((target.clone(), handle));
    }

    debug!("Dispatched {} branch(es): {}", handles.len(), action.describe());

    for (target, handle) in handles {
        if let Err(e) = handle.await {
            warn!("Branch for {} did not complete: {}", target.ip, e);
            let ip = target.ip.clone();
            record_failure(&failures, target, ExecutionError::Aborted(ip));
        }
    }

    let failures = std::mem::take(&mut *failures.lock().unwrap_or_else(|e| e.into_inner()));
    DispatchReport {
        attempted: targets.len(),
        failures,
    }
}
