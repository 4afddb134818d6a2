//! Lifecycle orchestrator
//!
//! Drives the cloud client and the remote shell through `start`, `stop` and
//! `poll`. Every value produced during a call (instance handle, address,
//! session) is local to that call; the orchestrator itself holds only the
//! configuration and its two collaborators.

use crate::control::{Control, RetryPolicy, Stage};
use crate::error::{LifecycleError, Result};
use crate::runtime::{Lifecycle, StopOutcome};
use crate::script::{self, OnFailure};
use async_trait::async_trait;
use dropflow_cloud::{CloudClient, CreateInstance, ServerInstance};
use dropflow_config::Config;
use dropflow_remote::{RemoteSession, RemoteShell, SshTarget};
use std::net::Ipv4Addr;

/// Authentication failures tolerated while a fresh instance installs its keys.
pub const AUTH_RETRY_LIMIT: u32 = 3;

pub struct Orchestrator<C, S> {
    cloud: C,
    shell: S,
    config: Config,
}

impl<C, S> Orchestrator<C, S>
where
    C: CloudClient,
    S: RemoteShell,
{
    pub fn new(cloud: C, shell: S, config: Config) -> Self {
        Self {
            cloud,
            shell,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cloud(&self) -> &C {
        &self.cloud
    }

    fn create_request(&self) -> CreateInstance {
        let cloud = &self.config.cloud;
        CreateInstance {
            name: cloud.droplet_name.clone(),
            region: cloud.region.clone(),
            size: cloud.droplet_size.clone(),
            image: cloud.droplet_image.clone(),
            ssh_keys: cloud.ssh_key_fingerprints.clone(),
            tags: cloud.tags.clone(),
            monitoring: cloud.monitoring,
        }
    }

    /// Poll the instance until it reports `active`.
    async fn wait_until_active(&self, id: u64, control: &Control) -> Result<()> {
        let interval = self.config.timing.instance_poll_interval;
        let mut polls = 0;

        loop {
            polls += 1;
            match control
                .guard(Stage::InstanceActive, polls, self.cloud.get_instance(id))
                .await?
            {
                Ok(instance) if instance.is_active() => {
                    tracing::info!("Instance {} is active", id);
                    return Ok(());
                }
                Ok(instance) => {
                    tracing::info!("Instance {} is {}, waiting", id, instance.status);
                }
                Err(e) if e.is_not_found() => return Err(LifecycleError::InstanceNotFound { id }),
                Err(e) if e.is_transient() => {
                    tracing::warn!("Polling instance {} failed, will retry: {}", id, e);
                }
                Err(e) => return Err(e.into()),
            }

            control.sleep(Stage::InstanceActive, interval, polls).await?;
        }
    }

    /// Point the pre-existing A record at `ip`.
    async fn update_dns(&self, ip: Ipv4Addr) -> Result<()> {
        let cloud = &self.config.cloud;
        let fqdn = cloud.fqdn();

        let record = self
            .cloud
            .list_dns_records(&cloud.domain, &fqdn, "A")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LifecycleError::DnsRecordNotFound { fqdn: fqdn.clone() })?;

        tracing::info!("Updating DNS record {} from {} to {}", fqdn, record.data, ip);
        self.cloud
            .update_dns_record(&cloud.domain, record.id, "A", &ip.to_string())
            .await?;
        Ok(())
    }

    /// Connect with the fixed retry delay, retrying only transient failures
    /// and a bounded number of authentication failures.
    async fn open_session(&self, host: Ipv4Addr, control: &Control) -> Result<S::Session> {
        let target = SshTarget::new(
            host.to_string(),
            self.config.remote.username.clone(),
            self.config.remote.private_key_path.clone(),
        );
        let policy = RetryPolicy::fixed(self.config.timing.ssh_retry_delay)
            .with_max_attempts(self.config.timing.connect_attempts);
        let mut attempts = 0;
        let mut auth_failures = 0;

        loop {
            attempts += 1;
            match control
                .guard(Stage::SessionConnect, attempts, self.shell.connect(&target))
                .await?
            {
                Ok(session) => {
                    tracing::info!("Connected to {} (attempt {})", target, attempts);
                    return Ok(session);
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!("Connection attempt {} to {} failed: {}", attempts, target, e);
                }
                Err(e) if e.is_auth_failure() && auth_failures < AUTH_RETRY_LIMIT => {
                    auth_failures += 1;
                    tracing::warn!(
                        "Authentication to {} rejected ({}/{}), keys may not be installed yet",
                        target,
                        auth_failures,
                        AUTH_RETRY_LIMIT
                    );
                }
                Err(e) => return Err(e.into()),
            }

            if !policy.allows_another(attempts) {
                return Err(LifecycleError::TimedOut {
                    stage: Stage::SessionConnect,
                    attempts,
                });
            }
            control
                .sleep(Stage::SessionConnect, policy.delay, attempts)
                .await?;
        }
    }

    async fn run_bootstrap(&self, session: &mut S::Session) -> Result<()> {
        let steps = script::bootstrap_steps(&self.config.server, &self.config.cloud.volume_name);

        for step in steps {
            tracing::info!("Running remote step: {}", step.name);
            let output = session.exec(&step.command).await?;
            if output.success() {
                continue;
            }

            match step.on_failure {
                OnFailure::Abort => {
                    return Err(LifecycleError::RemoteCommandFailed {
                        step: step.name.to_string(),
                        status: output.exit_status,
                        stderr: output.stderr.trim().to_string(),
                    });
                }
                OnFailure::Warn => tracing::warn!(
                    "Remote step '{}' exited with {}: {}",
                    step.name,
                    output.exit_status,
                    output.stderr.trim()
                ),
            }
        }
        Ok(())
    }

    async fn server_pids(&self, session: &mut S::Session) -> Result<Vec<u32>> {
        let command = script::find_pids_command(&self.config.server.process_path);
        let output = session.exec(&command).await?;
        Ok(script::parse_pids(&output.stdout))
    }

    /// Signal the server process and wait for it to exit.
    async fn terminate_server(
        &self,
        session: &mut S::Session,
        control: &Control,
    ) -> Result<Vec<u32>> {
        let pids = self.server_pids(session).await?;
        if pids.is_empty() {
            tracing::info!("No server process running");
            return Ok(pids);
        }

        tracing::info!("Sending SIGTERM to server process {:?}", pids);
        let output = session.exec(&script::terminate_command(&pids)).await?;
        if !output.success() {
            tracing::warn!("kill exited with {}: {}", output.exit_status, output.stderr.trim());
        }

        let interval = self.config.timing.process_poll_interval;
        let mut polls = 0;
        loop {
            control.sleep(Stage::ProcessExit, interval, polls).await?;
            polls += 1;

            let remaining: Vec<u32> = self
                .server_pids(session)
                .await?
                .into_iter()
                .filter(|pid| pids.contains(pid))
                .collect();
            if remaining.is_empty() {
                tracing::info!("Server process exited");
                return Ok(pids);
            }
            tracing::debug!("Still running: {:?}", remaining);
        }
    }

    /// Close a session, logging rather than failing if that goes wrong.
    async fn close_session(session: &mut S::Session) {
        if let Err(e) = session.close().await {
            tracing::warn!("Closing remote session failed: {}", e);
        }
    }

    pub async fn start(&self, control: &Control) -> Result<ServerInstance> {
        let cloud = &self.config.cloud;

        tracing::info!("Creating instance {} in {}", cloud.droplet_name, cloud.region);
        let created = self.cloud.create_instance(&self.create_request()).await?;
        let id = created.id;
        tracing::info!("Instance {} created", id);

        self.wait_until_active(id, control).await?;

        let instance = self.cloud.get_instance(id).await?;
        let ip = instance
            .public_ipv4
            .ok_or(LifecycleError::MissingAddress { id })?;
        tracing::info!("Instance {} has address {}", id, ip);

        self.update_dns(ip).await?;

        tracing::info!("Attaching volume {} to instance {}", cloud.volume_name, id);
        self.cloud
            .attach_volume_by_name(&cloud.volume_name, id, &cloud.region)
            .await?;

        tracing::info!(
            "Waiting {:?} for the SSH daemon",
            self.config.timing.ssh_initial_delay
        );
        control
            .sleep(Stage::SessionConnect, self.config.timing.ssh_initial_delay, 0)
            .await?;
        let mut session = self.open_session(ip, control).await?;

        let result = self.run_bootstrap(&mut session).await;
        Self::close_session(&mut session).await;
        result?;

        tracing::info!("Server started on {} ({})", ip, cloud.fqdn());
        Ok(instance)
    }

    pub async fn poll(&self) -> Result<Option<ServerInstance>> {
        let cloud = &self.config.cloud;
        let instances = self.cloud.list_instances_by_tag(cloud.lookup_tag()).await?;

        Ok(instances
            .into_iter()
            .find(|i| i.matches(&cloud.droplet_name, &cloud.region)))
    }

    pub async fn stop(&self, control: &Control) -> Result<StopOutcome> {
        let cloud = &self.config.cloud;

        let Some(instance) = self.poll().await? else {
            tracing::info!("No instance found, nothing to stop");
            return Ok(StopOutcome::AlreadyStopped);
        };
        let id = instance.id;

        let terminated_pids = match instance.public_ipv4 {
            Some(ip) if instance.is_active() => {
                let mut session = self.open_session(ip, control).await?;
                let result = self.terminate_server(&mut session, control).await;
                Self::close_session(&mut session).await;
                result?
            }
            _ => {
                tracing::warn!(
                    "Instance {} is {} without a reachable address, skipping process shutdown",
                    id,
                    instance.status
                );
                Vec::new()
            }
        };

        match self
            .cloud
            .get_volume_by_name(&cloud.volume_name, &cloud.region)
            .await?
        {
            Some(volume) if volume.is_attached_to(id) => {
                tracing::info!("Detaching volume {} from instance {}", cloud.volume_name, id);
                self.cloud
                    .detach_volume_by_name(&cloud.volume_name, id, &cloud.region)
                    .await?;
            }
            Some(_) => tracing::info!("Volume {} is not attached to instance {}", cloud.volume_name, id),
            None => tracing::warn!("Volume {} not found in {}", cloud.volume_name, cloud.region),
        }

        tracing::info!("Deleting instance {}", id);
        match self.cloud.delete_instance(id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => tracing::info!("Instance {} already deleted", id),
            Err(e) => return Err(e.into()),
        }

        Ok(StopOutcome::Stopped {
            instance_id: id,
            terminated_pids,
        })
    }
}

#[async_trait]
impl<C, S> Lifecycle for Orchestrator<C, S>
where
    C: CloudClient,
    S: RemoteShell,
{
    async fn start(&self, control: &Control) -> Result<ServerInstance> {
        Orchestrator::start(self, control).await
    }

    async fn stop(&self, control: &Control) -> Result<StopOutcome> {
        Orchestrator::stop(self, control).await
    }

    async fn poll(&self) -> Result<Option<ServerInstance>> {
        Orchestrator::poll(self).await
    }
}
