use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::DiscoveryError;

/// Shown in headers when an instance carries no name.
pub const NAME_PLACEHOLDER: &str = "N/A";

/// One remote host. Produced by discovery, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target {
    pub id: String,
    pub name: Option<String>,
    pub ip: String,
}

impl Target {
    pub fn new(id: impl Into<String>, name: Option<String>, ip: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.filter(|n| !n.is_empty()),
            ip: ip.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(NAME_PLACEHOLDER)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.display_name(), self.id, self.ip)
    }
}

/// Resolved targets keyed by instance id.
pub type TargetSet = BTreeMap<String, Target>;

/// Which address of an instance gets dialed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IpClass {
    Public,
    #[default]
    Private,
}

impl FromStr for IpClass {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(IpClass::Public),
            "private" => Ok(IpClass::Private),
            other => Err(DiscoveryError::InvalidIpClass(other.to_string())),
        }
    }
}

impl fmt::Display for IpClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpClass::Public => write!(f, "public"),
            IpClass::Private => write!(f, "private"),
        }
    }
}
