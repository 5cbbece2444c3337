use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::target::IpClass;

/// On-disk defaults. Loaded from <config_dir>/psh/config.yaml; every field
/// is optional and CLI flags win over whatever is set here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_private_key")]
    pub private_key: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub ip_type: IpClass,
    #[serde(default)]
    pub inventory: Option<String>,
    #[serde(default = "default_audit_log")]
    pub audit_log: String,
    #[serde(default)]
    pub host_key_check: bool,
}

fn default_user() -> String {
    "ec2-user".to_string()
}

fn default_private_key() -> String {
    "~/.ssh/id_rsa".to_string()
}

fn default_port() -> u16 {
    22
}

fn default_audit_log() -> String {
    "~/.psh_history".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: default_user(),
            private_key: default_private_key(),
            port: default_port(),
            ip_type: IpClass::default(),
            inventory: None,
            audit_log: default_audit_log(),
            host_key_check: false,
        }
    }
}

impl Config {
    /// Load config from the default path, falling back to built-in defaults.
    pub fn load_default() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        config_root().join("config.yaml")
    }

    /// Inventory location: the configured one, else next to the config file.
    pub fn inventory_path(&self) -> PathBuf {
        match &self.inventory {
            Some(p) => expand_home(p),
            None => config_root().join("inventory.yaml"),
        }
    }

    pub fn audit_log_path(&self) -> PathBuf {
        expand_home(&self.audit_log)
    }
}

fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("psh")
}

/// How the server's host key is treated during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostKeyPolicy {
    /// Accept any host key.
    #[default]
    Insecure,
    /// Require a matching entry in ~/.ssh/known_hosts.
    KnownHosts,
}

/// Connection parameters shared read-only by every branch of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub user: String,
    pub private_key: PathBuf,
    pub port: u16,
    pub host_key_policy: HostKeyPolicy,
}

impl SessionConfig {
    pub fn new(user: impl Into<String>, private_key: &str, port: u16) -> Self {
        Self {
            user: user.into(),
            private_key: expand_home(private_key),
            port,
            host_key_policy: HostKeyPolicy::default(),
        }
    }

    pub fn with_host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }
}

/// Expand a leading `~/` to the home directory; other paths pass through.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/"))
            .join(rest),
        None => PathBuf::from(path),
    }
}
