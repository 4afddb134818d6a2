//! Typed cloud records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Lifecycle status of a compute instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceStatus {
    Pending,
    Active,
    /// Any other provider status (`off`, `archive`, ...).
    Other(String),
}

impl InstanceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            InstanceStatus::Pending => "pending",
            InstanceStatus::Active => "active",
            InstanceStatus::Other(s) => s,
        }
    }
}

impl From<String> for InstanceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "new" | "pending" => InstanceStatus::Pending,
            "active" => InstanceStatus::Active,
            _ => InstanceStatus::Other(value),
        }
    }
}

impl From<InstanceStatus> for String {
    fn from(value: InstanceStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The provisioned game-server host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInstance {
    pub id: u64,
    pub name: String,
    pub region: String,
    pub size: String,
    pub image: String,
    pub status: InstanceStatus,
    /// Present only once the instance is active.
    pub public_ipv4: Option<Ipv4Addr>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ServerInstance {
    pub fn is_active(&self) -> bool {
        self.status == InstanceStatus::Active
    }

    /// Exact name and region match used to pick the managed instance.
    pub fn matches(&self, name: &str, region: &str) -> bool {
        self.name == name && self.region == region
    }
}

/// Parameters for creating the instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateInstance {
    pub name: String,
    pub region: String,
    pub size: String,
    pub image: String,
    /// SSH key fingerprints or ids embedded at creation.
    pub ssh_keys: Vec<String>,
    pub tags: Vec<String>,
    pub monitoring: bool,
}

/// A named block-storage volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub region: String,
    /// Instances the volume is currently attached to.
    #[serde(default)]
    pub droplet_ids: Vec<u64>,
}

impl Volume {
    pub fn is_attached_to(&self, instance_id: u64) -> bool {
        self.droplet_ids.contains(&instance_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeActionKind {
    Attach,
    Detach,
}

/// Result of a volume attach/detach request. Not awaited to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeAction {
    pub id: u64,
    pub kind: VolumeActionKind,
    pub status: String,
}

/// A single DNS record in a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: u64,
    pub record_type: String,
    /// Host part relative to the zone (`mc`, not `mc.example.com`).
    pub name: String,
    pub data: String,
    pub ttl: Option<u32>,
}
