//! DigitalOcean REST client

use crate::api::{
    ActionEnvelope, ApiErrorBody, CreateDropletRequest, DomainRecordEnvelope, DomainRecordList,
    DropletEnvelope, DropletPage, UpdateDomainRecordRequest, VolumeActionRequest, VolumeList,
};
use async_trait::async_trait;
use dropflow_cloud::{
    CloudClient, CloudError, ConnectivityProbe, CreateInstance, DnsRecord, Result, ServerInstance,
    Volume, VolumeAction, VolumeActionKind,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.digitalocean.com";

const PAGE_SIZE: u32 = 200;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// DigitalOcean API client
pub struct DigitalOceanClient {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
    probe_url: String,
}

impl DigitalOceanClient {
    /// Create a client for the public API.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_token, DEFAULT_API_BASE)
    }

    /// Create a client against another API root (used by tests).
    pub fn with_base_url(api_token: impl Into<String>, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dropflow/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            api_token: api_token.into(),
            probe_url: base_url.clone(),
            base_url,
        })
    }

    /// Endpoint hit by [`ConnectivityProbe::probe`]. Defaults to the API root.
    pub fn with_probe_url(mut self, probe_url: impl Into<String>) -> Self {
        self.probe_url = probe_url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(transport)?;
        check_status(response, what).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.send(self.client.get(url), what).await?;
        decode(response).await
    }
}

#[async_trait]
impl CloudClient for DigitalOceanClient {
    async fn create_instance(&self, request: &CreateInstance) -> Result<ServerInstance> {
        let url = self.url("/droplets");
        tracing::debug!("POST {}", url);

        let body = CreateDropletRequest::from(request);
        let response = self
            .send(self.client.post(&url).json(&body), "droplets")
            .await?;
        let envelope: DropletEnvelope = decode(response).await?;

        Ok(envelope.droplet.into())
    }

    async fn get_instance(&self, id: u64) -> Result<ServerInstance> {
        let url = self.url(&format!("/droplets/{}", id));
        let envelope: DropletEnvelope = self.get_json(&url, &format!("droplet {}", id)).await?;

        Ok(envelope.droplet.into())
    }

    async fn list_instances_by_tag(&self, tag: &str) -> Result<Vec<ServerInstance>> {
        let mut instances = Vec::new();
        let per_page = PAGE_SIZE.to_string();
        let first = reqwest::Url::parse_with_params(
            &self.url("/droplets"),
            &[("tag_name", tag), ("per_page", per_page.as_str())],
        )
        .map_err(|e| CloudError::Decode(e.to_string()))?;
        let mut next = Some(first.to_string());

        while let Some(url) = next.take() {
            let page: DropletPage = self.get_json(&url, "droplets").await?;
            next = page.next_page().map(String::from);
            instances.extend(page.droplets.into_iter().map(ServerInstance::from));
        }

        Ok(instances)
    }

    async fn delete_instance(&self, id: u64) -> Result<()> {
        let url = self.url(&format!("/droplets/{}", id));
        tracing::debug!("DELETE {}", url);

        self.send(self.client.delete(&url), &format!("droplet {}", id))
            .await?;
        Ok(())
    }

    async fn attach_volume_by_name(
        &self,
        volume_name: &str,
        instance_id: u64,
        region: &str,
    ) -> Result<VolumeAction> {
        self.volume_action(VolumeActionKind::Attach, volume_name, instance_id, region)
            .await
    }

    async fn detach_volume_by_name(
        &self,
        volume_name: &str,
        instance_id: u64,
        region: &str,
    ) -> Result<VolumeAction> {
        self.volume_action(VolumeActionKind::Detach, volume_name, instance_id, region)
            .await
    }

    async fn get_volume_by_name(&self, volume_name: &str, region: &str) -> Result<Option<Volume>> {
        let url = reqwest::Url::parse_with_params(
            &self.url("/volumes"),
            &[("name", volume_name), ("region", region)],
        )
        .map_err(|e| CloudError::Decode(e.to_string()))?;
        let list: VolumeList = self
            .get_json(url.as_str(), &format!("volume {}", volume_name))
            .await?;

        Ok(list.volumes.into_iter().next().map(Volume::from))
    }

    async fn list_dns_records(
        &self,
        domain: &str,
        fqdn: &str,
        record_type: &str,
    ) -> Result<Vec<DnsRecord>> {
        let url = reqwest::Url::parse_with_params(
            &self.url(&format!("/domains/{}/records", domain)),
            &[("name", fqdn), ("type", record_type)],
        )
        .map_err(|e| CloudError::Decode(e.to_string()))?;
        let list: DomainRecordList = self
            .get_json(url.as_str(), &format!("domain {}", domain))
            .await?;

        Ok(list.domain_records.into_iter().map(DnsRecord::from).collect())
    }

    async fn update_dns_record(
        &self,
        domain: &str,
        record_id: u64,
        record_type: &str,
        data: &str,
    ) -> Result<DnsRecord> {
        let url = self.url(&format!("/domains/{}/records/{}", domain, record_id));
        tracing::debug!("PUT {}", url);

        let body = UpdateDomainRecordRequest { record_type, data };
        let response = self
            .send(
                self.client.put(&url).json(&body),
                &format!("domain record {}", record_id),
            )
            .await?;
        let envelope: DomainRecordEnvelope = decode(response).await?;

        Ok(envelope.domain_record.into())
    }
}

impl DigitalOceanClient {
    async fn volume_action(
        &self,
        kind: VolumeActionKind,
        volume_name: &str,
        droplet_id: u64,
        region: &str,
    ) -> Result<VolumeAction> {
        let url = self.url("/volumes/actions");
        tracing::debug!("POST {} ({:?} {})", url, kind, volume_name);

        let body = VolumeActionRequest {
            kind,
            volume_name,
            droplet_id,
            region,
        };
        let response = self
            .send(
                self.client.post(&url).json(&body),
                &format!("volume {}", volume_name),
            )
            .await?;
        let envelope: ActionEnvelope = decode(response).await?;

        Ok(envelope.into_action(kind))
    }
}

#[async_trait]
impl ConnectivityProbe for DigitalOceanClient {
    async fn probe(&self) -> bool {
        match self
            .client
            .get(&self.probe_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Connectivity probe to {} failed: {}", self.probe_url, e);
                false
            }
        }
    }
}

fn transport(e: reqwest::Error) -> CloudError {
    CloudError::Transport(e.to_string())
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&bytes).map_err(|e| CloudError::Decode(e.to_string()))
}

async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = status.as_u16();
    match code {
        401 | 403 => Err(CloudError::Unauthorized(code)),
        404 => Err(CloudError::NotFound(what.to_string())),
        429 => Err(CloudError::RateLimited),
        _ => {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            Err(CloudError::Api {
                status: code,
                message,
            })
        }
    }
}
