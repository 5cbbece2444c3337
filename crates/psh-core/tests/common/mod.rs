#![allow(dead_code)]

use psh_core::audit::AuditSink;
use psh_core::command::CommandExecutor;
use psh_core::dispatch::OutputSink;
use psh_core::error::ExecutionError;
use psh_core::request::Permission;
use psh_core::target::{Target, TargetSet};
use psh_core::transport::{Connection, Connector};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&Target, &str) -> Result<String, ExecutionError> + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFile {
    pub ip: String,
    pub dest: String,
    pub mode: u32,
    pub contents: Vec<u8>,
}

/// Connector whose remote side is a closure over (target, command).
#[derive(Clone)]
pub struct MockConnector {
    responder: Arc<Responder>,
    pub commands: Arc<Mutex<Vec<(String, String)>>>,
    pub sent: Arc<Mutex<Vec<SentFile>>>,
    pub opens: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    refuse: Option<String>,
    send_error: Option<String>,
}

impl MockConnector {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Target, &str) -> Result<String, ExecutionError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            commands: Arc::new(Mutex::new(Vec::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            refuse: None,
            send_error: None,
        }
    }

    /// Every command succeeds and prints `ok`.
    pub fn ok() -> Self {
        Self::new(|_, _| Ok("ok".to_string()))
    }

    /// Fail `open` for the target with this ip.
    pub fn refusing(mut self, ip: &str) -> Self {
        self.refuse = Some(ip.to_string());
        self
    }

    pub fn failing_send(mut self, reason: &str) -> Self {
        self.send_error = Some(reason.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn sent_files(&self) -> Vec<SentFile> {
        self.sent.lock().unwrap().clone()
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Connector for MockConnector {
    fn open(&self, target: &Target) -> Result<Box<dyn Connection>, ExecutionError> {
        if self.refuse.as_deref() == Some(target.ip.as_str()) {
            return Err(ExecutionError::Connection(format!(
                "TCP connect to {}:22: connection refused",
                target.ip
            )));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            target: target.clone(),
            connector: self.clone(),
        }))
    }
}

struct MockConnection {
    target: Target,
    connector: MockConnector,
}

impl Connection for MockConnection {
    fn exec(&mut self, command: &str) -> Result<String, ExecutionError> {
        self.connector
            .commands
            .lock()
            .unwrap()
            .push((self.target.ip.clone(), command.to_string()));
        (self.connector.responder)(&self.target, command)
    }

    fn send_file(
        &mut self,
        source: &mut dyn Read,
        size: u64,
        dest: &str,
        permission: Permission,
    ) -> Result<(), ExecutionError> {
        if let Some(reason) = &self.connector.send_error {
            return Err(ExecutionError::Transfer(reason.clone()));
        }
        let mut contents = Vec::new();
        source.read_to_end(&mut contents).unwrap();
        assert_eq!(contents.len() as u64, size);
        self.connector.sent.lock().unwrap().push(SentFile {
            ip: self.target.ip.clone(),
            dest: dest.to_string(),
            mode: permission.mode(),
            contents,
        });
        Ok(())
    }

    fn close(self: Box<Self>) {
        self.connector.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Audit sink that keeps (ip, command, failed) in memory.
#[derive(Default)]
pub struct MemoryAudit {
    pub records: Mutex<Vec<(String, String, bool)>>,
}

impl AuditSink for MemoryAudit {
    fn record(&self, target: &Target, command: &str, error: Option<&ExecutionError>) {
        self.records
            .lock()
            .unwrap()
            .push((target.ip.clone(), command.to_string(), error.is_some()));
    }
}

/// Output sink that keeps every emitted transcript.
#[derive(Default)]
pub struct CaptureSink {
    pub emitted: Mutex<Vec<(Target, String)>>,
}

impl OutputSink for CaptureSink {
    fn emit(&self, target: &Target, output: &str) {
        self.emitted
            .lock()
            .unwrap()
            .push((target.clone(), output.to_string()));
    }
}

pub fn target(n: usize) -> Target {
    Target::new(
        format!("i-{:04}", n),
        Some(format!("web-{}", n)),
        format!("10.0.0.{}", n),
    )
}

pub fn targets(count: usize) -> TargetSet {
    (1..=count).map(|n| (target(n).id.clone(), target(n))).collect()
}

pub fn executor(connector: &MockConnector) -> (CommandExecutor, Arc<MemoryAudit>) {
    let audit = Arc::new(MemoryAudit::default());
    let exec = CommandExecutor::new(Arc::new(connector.clone()), audit.clone());
    (exec, audit)
}
