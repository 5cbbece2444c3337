pub mod ssh_connector;

pub use ssh_connector::{SshConnection, SshConnector};
