pub mod action;
pub mod audit;
pub mod command;
pub mod config;
pub mod decompress;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod header;
pub mod probe;
pub mod request;
pub mod target;
pub mod transfer;
pub mod transport;

pub use action::{bind, Action, CommandAction, TransferAction};
pub use audit::{AuditSink, JsonlAuditLog, NullAudit};
pub use command::CommandExecutor;
pub use config::{Config, HostKeyPolicy, SessionConfig};
pub use dispatch::{dispatch, DispatchReport, OutputSink, StdoutSink};
pub use error::{DiscoveryError, ExecutionError};
pub use request::{ExecutionRequest, Permission, TransferOptions, TransferRequest};
pub use target::{IpClass, Target, TargetSet};
pub use transfer::TransferExecutor;
pub use transport::{Connection, Connector};
