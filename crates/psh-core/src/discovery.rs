use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::DiscoveryError;
use crate::target::{IpClass, Target, TargetSet};

/// Tag key whose value doubles as the instance name.
pub const NAME_TAG: &str = "Name";

/// Resolves a tag filter to the hosts a run will touch.
pub trait TargetSource {
    fn resolve(
        &self,
        tags: &BTreeMap<String, String>,
        ip_class: IpClass,
    ) -> Result<TargetSet, DiscoveryError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

fn default_state() -> String {
    "running".to_string()
}

impl InstanceRecord {
    pub fn is_running(&self) -> bool {
        self.state == "running"
    }

    fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        tags.iter().all(|(k, v)| self.tags.get(k) == Some(v))
    }

    fn address(&self, ip_class: IpClass) -> Option<&str> {
        match ip_class {
            IpClass::Public => self.public_ip.as_deref(),
            IpClass::Private => self.private_ip.as_deref(),
        }
    }

    fn display_name(&self) -> Option<String> {
        self.name
            .clone()
            .or_else(|| self.tags.get(NAME_TAG).cloned())
    }
}

/// Static inventory file listing instances and their tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub instances: Vec<InstanceRecord>,
}

impl Inventory {
    pub fn load_from(path: &Path) -> Result<Self, DiscoveryError> {
        let inventory_error = |reason: String| DiscoveryError::Inventory {
            path: path.display().to_string(),
            reason,
        };
        let contents = std::fs::read_to_string(path).map_err(|e| inventory_error(e.to_string()))?;
        Self::from_yaml(&contents).map_err(|e| match e {
            DiscoveryError::Inventory { reason, .. } => inventory_error(reason),
            other => other,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, DiscoveryError> {
        serde_yaml::from_str(contents).map_err(|e| DiscoveryError::Inventory {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }
}

impl TargetSource for Inventory {
    fn resolve(
        &self,
        tags: &BTreeMap<String, String>,
        ip_class: IpClass,
    ) -> Result<TargetSet, DiscoveryError> {
        let mut targets = TargetSet::new();
        for instance in self.instances.iter().filter(|i| i.is_running() && i.matches(tags)) {
            match instance.address(ip_class) {
                Some(ip) => {
                    targets.insert(
                        instance.id.clone(),
                        Target::new(instance.id.clone(), instance.display_name(), ip),
                    );
                }
                None => debug!("Skipping {}: no {} address", instance.id, ip_class),
            }
        }

        if targets.is_empty() {
            return Err(DiscoveryError::NoTargets);
        }
        Ok(targets)
    }
}

/// Parse `key=value,key2=value2`. Pairs without `=` are ignored.
pub fn parse_tags(tags: &str) -> BTreeMap<String, String> {
    tags.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}
