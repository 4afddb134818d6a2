pub mod check;
pub mod lifecycle;
pub mod panel;
pub mod wait_online;

use dropflow_cloud_digitalocean::DigitalOceanClient;
use dropflow_config::Config;
use dropflow_lifecycle::{Control, Orchestrator};
use dropflow_remote::OpenSshShell;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub type DefaultOrchestrator = Orchestrator<DigitalOceanClient, OpenSshShell>;

pub fn cloud_client(config: &Config) -> anyhow::Result<DigitalOceanClient> {
    Ok(DigitalOceanClient::new(config.cloud.access_token.clone())?.with_probe_url(config.probe_url.clone()))
}

pub fn orchestrator(config: Config) -> anyhow::Result<DefaultOrchestrator> {
    let cloud = cloud_client(&config)?;
    Ok(Orchestrator::new(cloud, OpenSshShell::new(), config))
}

/// A flag timeout wins over the configured one.
pub fn control(config: &Config, timeout: Option<Duration>, cancel: CancellationToken) -> Control {
    Control::with_cancellation(cancel)
        .with_optional_timeout(timeout.or(config.timing.operation_timeout))
}
