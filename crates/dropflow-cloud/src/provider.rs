//! Cloud client trait definitions

use crate::error::Result;
use crate::model::{CreateInstance, DnsRecord, ServerInstance, Volume, VolumeAction};
use async_trait::async_trait;

/// Cloud Resource Client abstraction
///
/// Implemented by the DigitalOcean REST client and by in-memory fakes in
/// tests. All operations are single requests; retry policy belongs to the
/// caller.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Create an instance and return it in its initial (pending) state.
    async fn create_instance(&self, request: &CreateInstance) -> Result<ServerInstance>;

    async fn get_instance(&self, id: u64) -> Result<ServerInstance>;

    /// List every instance carrying `tag`.
    async fn list_instances_by_tag(&self, tag: &str) -> Result<Vec<ServerInstance>>;

    /// Delete an instance. Fails with `NotFound` if it is already gone.
    async fn delete_instance(&self, id: u64) -> Result<()>;

    async fn attach_volume_by_name(
        &self,
        volume_name: &str,
        instance_id: u64,
        region: &str,
    ) -> Result<VolumeAction>;

    async fn detach_volume_by_name(
        &self,
        volume_name: &str,
        instance_id: u64,
        region: &str,
    ) -> Result<VolumeAction>;

    /// Look a volume up by name within a region.
    async fn get_volume_by_name(&self, volume_name: &str, region: &str) -> Result<Option<Volume>>;

    /// List records in `domain` whose fully-qualified name is `fqdn`.
    async fn list_dns_records(
        &self,
        domain: &str,
        fqdn: &str,
        record_type: &str,
    ) -> Result<Vec<DnsRecord>>;

    /// Point an existing record at `data`.
    async fn update_dns_record(
        &self,
        domain: &str,
        record_id: u64,
        record_type: &str,
        data: &str,
    ) -> Result<DnsRecord>;
}

/// Outbound reachability check used by the connectivity waiter.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Returns `true` once the network answers at all.
    async fn probe(&self) -> bool;
}
