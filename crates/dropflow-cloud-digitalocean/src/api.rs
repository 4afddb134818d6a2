//! Wire types for the DigitalOcean v2 API
//!
//! Only the fields dropflow reads are declared; everything else in the
//! payloads is ignored by serde.

use chrono::{DateTime, Utc};
use dropflow_cloud::{
    CreateInstance, DnsRecord, InstanceStatus, ServerInstance, Volume, VolumeAction,
    VolumeActionKind,
};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

#[derive(Debug, Deserialize)]
pub(crate) struct DropletEnvelope {
    pub droplet: ApiDroplet,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DropletPage {
    #[serde(default)]
    pub droplets: Vec<ApiDroplet>,
    #[serde(default)]
    pub links: Option<Links>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Links {
    #[serde(default)]
    pub pages: Option<Pages>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Pages {
    pub next: Option<String>,
}

impl DropletPage {
    pub fn next_page(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.pages.as_ref())
            .and_then(|p| p.next.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiDroplet {
    id: u64,
    name: String,
    status: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    region: ApiSlug,
    #[serde(default)]
    size_slug: Option<String>,
    #[serde(default)]
    image: Option<ApiImage>,
    #[serde(default)]
    networks: ApiNetworks,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSlug {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct ApiImage {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiNetworks {
    #[serde(default)]
    v4: Vec<ApiV4>,
}

#[derive(Debug, Deserialize)]
struct ApiV4 {
    ip_address: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl ApiNetworks {
    /// First public v4 address, else the first address listed.
    fn public_ipv4(&self) -> Option<Ipv4Addr> {
        self.v4
            .iter()
            .find(|n| n.kind.as_deref() == Some("public"))
            .or_else(|| self.v4.first())
            .and_then(|n| n.ip_address.parse().ok())
    }
}

impl From<ApiDroplet> for ServerInstance {
    fn from(d: ApiDroplet) -> Self {
        let public_ipv4 = d.networks.public_ipv4();
        let image = d
            .image
            .and_then(|i| i.slug.or(i.name).or(i.id.map(|id| id.to_string())))
            .unwrap_or_default();
        ServerInstance {
            id: d.id,
            name: d.name,
            region: d.region.slug,
            size: d.size_slug.unwrap_or_default(),
            image,
            status: InstanceStatus::from(d.status),
            public_ipv4,
            tags: d.tags,
            created_at: d.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateDropletRequest<'a> {
    name: &'a str,
    region: &'a str,
    size: &'a str,
    image: &'a str,
    ssh_keys: &'a [String],
    tags: &'a [String],
    monitoring: bool,
}

impl<'a> From<&'a CreateInstance> for CreateDropletRequest<'a> {
    fn from(r: &'a CreateInstance) -> Self {
        Self {
            name: &r.name,
            region: &r.region,
            size: &r.size,
            image: &r.image,
            ssh_keys: &r.ssh_keys,
            tags: &r.tags,
            monitoring: r.monitoring,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct VolumeActionRequest<'a> {
    #[serde(rename = "type")]
    pub kind: VolumeActionKind,
    pub volume_name: &'a str,
    pub droplet_id: u64,
    pub region: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActionEnvelope {
    action: ApiAction,
}

#[derive(Debug, Deserialize)]
struct ApiAction {
    id: u64,
    status: String,
}

impl ActionEnvelope {
    pub fn into_action(self, kind: VolumeActionKind) -> VolumeAction {
        VolumeAction {
            id: self.action.id,
            kind,
            status: self.action.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct VolumeList {
    #[serde(default)]
    pub volumes: Vec<ApiVolume>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiVolume {
    id: String,
    name: String,
    region: ApiSlug,
    #[serde(default)]
    droplet_ids: Vec<u64>,
}

impl From<ApiVolume> for Volume {
    fn from(v: ApiVolume) -> Self {
        Volume {
            id: v.id,
            name: v.name,
            region: v.region.slug,
            droplet_ids: v.droplet_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DomainRecordList {
    #[serde(default)]
    pub domain_records: Vec<ApiDomainRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DomainRecordEnvelope {
    pub domain_record: ApiDomainRecord,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiDomainRecord {
    id: u64,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    data: String,
    #[serde(default)]
    ttl: Option<u32>,
}

impl From<ApiDomainRecord> for DnsRecord {
    fn from(r: ApiDomainRecord) -> Self {
        DnsRecord {
            id: r.id,
            record_type: r.record_type,
            name: r.name,
            data: r.data,
            ttl: r.ttl,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateDomainRecordRequest<'a> {
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub data: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
