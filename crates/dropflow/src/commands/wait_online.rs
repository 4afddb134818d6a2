use colored::Colorize;
use dropflow_config::Config;
use dropflow_lifecycle::wait_until_connected;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub async fn handle(
    config: &Config,
    timeout: Option<Duration>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let client = super::cloud_client(config)?;
    let control = dropflow_lifecycle::Control::with_cancellation(cancel).with_optional_timeout(timeout);

    println!("Waiting for {}...", config.probe_url.cyan());
    let probes = wait_until_connected(&client, config.timing.connectivity_retry_delay, &control).await?;

    println!(
        "{}",
        format!("✓ Online (after {} probe{})", probes, if probes == 1 { "" } else { "s" })
            .green()
            .bold()
    );
    Ok(())
}
