//! In-memory fakes for the cloud client and the remote shell.
#![allow(dead_code)]

use async_trait::async_trait;
use dropflow_cloud::{
    CloudClient, CloudError, CreateInstance, DnsRecord, InstanceStatus, ServerInstance, Volume,
    VolumeAction, VolumeActionKind,
};
use dropflow_config::Config;
use dropflow_remote::{CommandOutput, RemoteError, RemoteSession, RemoteShell, SshTarget};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

pub const DOMAIN: &str = "example.com";
pub const VOLUME: &str = "mc-data";

pub fn config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DO_ACCESS_TOKEN", "token"),
        ("DO_SSH_KEY_FINGERPRINTS", "aa:bb"),
        ("DO_DROPLET_SSH_ACCESS_KEY", "/keys/id_rsa"),
        ("DO_NETWORK_DOMAIN", DOMAIN),
        ("DO_NETWORK_SUBDOMAIN", "mc"),
        ("DO_VOLUME_NAME", VOLUME),
        ("DO_DROPLET_NAME", "X"),
        ("DO_REGION", "sgp1"),
        ("DO_DROPLET_TAGS", "games"),
    ]);
    Config::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap()
}

pub fn instance(id: u64, name: &str, region: &str) -> ServerInstance {
    ServerInstance {
        id,
        name: name.to_string(),
        region: region.to_string(),
        size: "s-2vcpu-4gb".to_string(),
        image: "ubuntu-20-04-x64".to_string(),
        status: InstanceStatus::Active,
        public_ipv4: Some(address_for(id)),
        tags: vec!["games".to_string()],
        created_at: None,
    }
}

pub fn address_for(id: u64) -> Ipv4Addr {
    Ipv4Addr::new(203, 0, 113, (id % 250) as u8 + 1)
}

// ============ Cloud ============

#[derive(Default)]
pub struct CloudState {
    pub instances: Vec<ServerInstance>,
    pub next_id: u64,
    /// `get_instance` calls that still report pending, per instance.
    pub pending_polls: u32,
    gets: HashMap<u64, u32>,
    pub dns_records: Vec<DnsRecord>,
    pub volume: Option<Volume>,
    /// Ordered log of mutating and significant calls.
    pub calls: Vec<String>,
    pub dns_writes: Vec<String>,
    /// Errors returned by the next calls of an operation, in order.
    failures: HashMap<&'static str, VecDeque<CloudError>>,
}

impl CloudState {
    fn take_failure(&mut self, operation: &str) -> Option<CloudError> {
        self.failures.get_mut(operation)?.pop_front()
    }
}

#[derive(Clone)]
pub struct MockCloud {
    pub state: Arc<Mutex<CloudState>>,
}

impl MockCloud {
    pub fn new() -> Self {
        let state = CloudState {
            next_id: 100,
            pending_polls: 2,
            dns_records: vec![DnsRecord {
                id: 1,
                record_type: "A".to_string(),
                name: "mc".to_string(),
                data: "192.0.2.1".to_string(),
                ttl: Some(1800),
            }],
            volume: Some(Volume {
                id: "vol-1".to_string(),
                name: VOLUME.to_string(),
                region: "sgp1".to_string(),
                droplet_ids: vec![],
            }),
            ..CloudState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_instance(self, instance: ServerInstance) -> Self {
        self.state.lock().unwrap().instances.push(instance);
        self
    }

    /// Make the next call of `operation` (`"get_instance"`, `"delete_instance"`)
    /// fail with `error`. Queued failures are returned in order.
    pub fn failing(self, operation: &'static str, error: CloudError) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }
}

#[async_trait]
impl CloudClient for MockCloud {
    async fn create_instance(&self, request: &CreateInstance) -> dropflow_cloud::Result<ServerInstance> {
        let mut s = self.state.lock().unwrap();
        s.next_id += 1;
        let created = ServerInstance {
            id: s.next_id,
            name: request.name.clone(),
            region: request.region.clone(),
            size: request.size.clone(),
            image: request.image.clone(),
            status: InstanceStatus::Pending,
            public_ipv4: None,
            tags: request.tags.clone(),
            created_at: None,
        };
        s.calls.push(format!("create:{}", created.id));
        s.instances.push(created.clone());
        Ok(created)
    }

    async fn get_instance(&self, id: u64) -> dropflow_cloud::Result<ServerInstance> {
        let mut guard = self.state.lock().unwrap();
        let s = &mut *guard;
        if let Some(err) = s.take_failure("get_instance") {
            s.calls.push(format!("get:{}:error", id));
            return Err(err);
        }
        let pending_polls = s.pending_polls;
        let gets = s.gets.entry(id).or_insert(0);
        *gets += 1;
        let becomes_active = *gets > pending_polls;

        let instance = s
            .instances
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| CloudError::NotFound(format!("droplet {id}")))?;
        if becomes_active && !instance.is_active() {
            instance.status = InstanceStatus::Active;
            instance.public_ipv4 = Some(address_for(id));
        }
        let snapshot = instance.clone();
        s.calls.push(format!("get:{}:{}", id, snapshot.status));
        Ok(snapshot)
    }

    async fn list_instances_by_tag(&self, tag: &str) -> dropflow_cloud::Result<Vec<ServerInstance>> {
        let s = self.state.lock().unwrap();
        Ok(s.instances
            .iter()
            .filter(|i| i.tags.iter().any(|t| t == tag))
            .cloned()
            .collect())
    }

    async fn delete_instance(&self, id: u64) -> dropflow_cloud::Result<()> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(format!("delete:{}", id));
        if let Some(err) = s.take_failure("delete_instance") {
            return Err(err);
        }
        let before = s.instances.len();
        s.instances.retain(|i| i.id != id);
        if s.instances.len() == before {
            return Err(CloudError::NotFound(format!("droplet {id}")));
        }
        Ok(())
    }

    async fn attach_volume_by_name(
        &self,
        volume_name: &str,
        instance_id: u64,
        _region: &str,
    ) -> dropflow_cloud::Result<VolumeAction> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(format!("attach:{}:{}", volume_name, instance_id));
        let volume = s
            .volume
            .as_mut()
            .ok_or_else(|| CloudError::NotFound(volume_name.to_string()))?;
        volume.droplet_ids = vec![instance_id];
        Ok(VolumeAction {
            id: 1,
            kind: VolumeActionKind::Attach,
            status: "in-progress".to_string(),
        })
    }

    async fn detach_volume_by_name(
        &self,
        volume_name: &str,
        instance_id: u64,
        _region: &str,
    ) -> dropflow_cloud::Result<VolumeAction> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(format!("detach:{}:{}", volume_name, instance_id));
        let volume = s
            .volume
            .as_mut()
            .ok_or_else(|| CloudError::NotFound(volume_name.to_string()))?;
        volume.droplet_ids.retain(|id| *id != instance_id);
        Ok(VolumeAction {
            id: 2,
            kind: VolumeActionKind::Detach,
            status: "in-progress".to_string(),
        })
    }

    async fn get_volume_by_name(
        &self,
        volume_name: &str,
        region: &str,
    ) -> dropflow_cloud::Result<Option<Volume>> {
        let s = self.state.lock().unwrap();
        Ok(s.volume
            .clone()
            .filter(|v| v.name == volume_name && v.region == region))
    }

    async fn list_dns_records(
        &self,
        domain: &str,
        fqdn: &str,
        record_type: &str,
    ) -> dropflow_cloud::Result<Vec<DnsRecord>> {
        let s = self.state.lock().unwrap();
        Ok(s.dns_records
            .iter()
            .filter(|r| format!("{}.{}", r.name, domain) == fqdn && r.record_type == record_type)
            .cloned()
            .collect())
    }

    async fn update_dns_record(
        &self,
        _domain: &str,
        record_id: u64,
        _record_type: &str,
        data: &str,
    ) -> dropflow_cloud::Result<DnsRecord> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(format!("dns:{}", data));
        s.dns_writes.push(data.to_string());
        let record = s
            .dns_records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| CloudError::NotFound(format!("record {record_id}")))?;
        record.data = data.to_string();
        Ok(record.clone())
    }
}

// ============ Remote shell ============

#[derive(Debug, Clone, Copy)]
pub enum ConnectFailure {
    Refused,
    Auth,
    Protocol,
}

#[derive(Default)]
pub struct ShellState {
    /// Failures returned by the next connect attempts, in order.
    pub connect_failures: VecDeque<ConnectFailure>,
    pub connect_times: Vec<Instant>,
    pub targets: Vec<SshTarget>,
    /// Every command executed, across all sessions.
    pub commands: Vec<String>,
    /// Exit status for commands containing the key.
    pub failing: Vec<(String, i32)>,
    /// Server processes currently running on the host.
    pub pids: Vec<u32>,
    /// Process-table queries after the signal before the processes exit.
    pub exit_after_queries: u32,
    queries_since_kill: Option<u32>,
    pub closed_sessions: u32,
}

#[derive(Clone, Default)]
pub struct FakeShell {
    pub state: Arc<Mutex<ShellState>>,
}

impl FakeShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_connects(self, failures: &[ConnectFailure]) -> Self {
        self.state
            .lock()
            .unwrap()
            .connect_failures
            .extend(failures.iter().copied());
        self
    }

    pub fn with_server_process(self, pids: &[u32], exit_after_queries: u32) -> Self {
        {
            let mut s = self.state.lock().unwrap();
            s.pids = pids.to_vec();
            s.exit_after_queries = exit_after_queries;
        }
        self
    }

    pub fn failing_command(self, contains: &str, status: i32) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing
            .push((contains.to_string(), status));
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn command_index(&self, contains: &str) -> Option<usize> {
        self.commands().iter().position(|c| c.contains(contains))
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().connect_times.clone()
    }
}

pub struct FakeSession {
    state: Arc<Mutex<ShellState>>,
    open: bool,
}

#[async_trait]
impl RemoteShell for FakeShell {
    type Session = FakeSession;

    async fn connect(&self, target: &SshTarget) -> dropflow_remote::Result<FakeSession> {
        let mut s = self.state.lock().unwrap();
        s.connect_times.push(Instant::now());
        s.targets.push(target.clone());
        match s.connect_failures.pop_front() {
            None => Ok(FakeSession {
                state: self.state.clone(),
                open: true,
            }),
            Some(ConnectFailure::Refused) => Err(RemoteError::ConnectionRefused(target.host.clone())),
            Some(ConnectFailure::Auth) => Err(RemoteError::AuthenticationFailed {
                host: target.host.clone(),
                detail: "Permission denied (publickey).".to_string(),
            }),
            Some(ConnectFailure::Protocol) => {
                Err(RemoteError::Protocol("Bad configuration option".to_string()))
            }
        }
    }
}

#[async_trait]
impl RemoteSession for FakeSession {
    async fn exec(&mut self, command: &str) -> dropflow_remote::Result<CommandOutput> {
        if !self.open {
            return Err(RemoteError::SessionClosed);
        }
        let mut guard = self.state.lock().unwrap();
        let s = &mut *guard;
        s.commands.push(command.to_string());

        if command.starts_with("ps ") {
            if let Some(queries) = s.queries_since_kill.as_mut() {
                *queries += 1;
                if *queries > s.exit_after_queries {
                    s.pids.clear();
                }
            }
            let stdout: String = s.pids.iter().map(|p| format!("{p}\n")).collect();
            return Ok(CommandOutput {
                stdout,
                ..CommandOutput::default()
            });
        }
        if command.starts_with("kill ") {
            s.queries_since_kill = Some(0);
        }

        let exit_status = s
            .failing
            .iter()
            .find(|(key, _)| command.contains(key.as_str()))
            .map(|(_, status)| *status)
            .unwrap_or(0);
        Ok(CommandOutput {
            stdout: String::new(),
            stderr: if exit_status == 0 {
                String::new()
            } else {
                "command failed".to_string()
            },
            exit_status,
        })
    }

    async fn close(&mut self) -> dropflow_remote::Result<()> {
        if !self.open {
            return Err(RemoteError::SessionClosed);
        }
        self.open = false;
        self.state.lock().unwrap().closed_sessions += 1;
        Ok(())
    }
}
