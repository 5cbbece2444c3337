pub mod config;
pub mod scp;
pub mod ssh;
pub mod targets;
