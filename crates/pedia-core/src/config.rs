//! pedia.toml configuration parser.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{GroupVersionKind, GroupVersionResource};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PediaConfig {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub owner_scope: OwnerScope,
}

/// Where owner references are resolved when walking an ownership chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerScope {
    /// Names resolve against every live record of the storage.
    #[default]
    Global,
    /// Only records in the subject's cluster.
    Cluster,
    /// Only records in the subject's cluster and namespace.
    Namespace,
}

/// One stored resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub resource: String,
    pub kind: String,
}

impl ResourceConfig {
    pub fn new(group: &str, version: &str, resource: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
            kind: kind.to_string(),
        }
    }

    pub fn group_version_resource(&self) -> GroupVersionResource {
        GroupVersionResource::new(&self.group, &self.version, &self.resource)
    }

    pub fn group_version_kind(&self) -> GroupVersionKind {
        GroupVersionKind::new(&self.group, &self.version, &self.kind)
    }
}

impl PediaConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PediaConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// A config registering the workload kinds most fixtures need.
    pub fn scaffold() -> Self {
        PediaConfig {
            store: StoreSettings::default(),
            resources: vec![
                ResourceConfig::new("", "v1", "pods", "Pod"),
                ResourceConfig::new("apps", "v1", "replicasets", "ReplicaSet"),
                ResourceConfig::new("apps", "v1", "deployments", "Deployment"),
            ],
        }
    }

    /// Look up the resource registered for a kind.
    pub fn resource_for_kind(&self, kind: &str) -> Option<&ResourceConfig> {
        self.resources.iter().find(|r| r.kind == kind)
    }
}
