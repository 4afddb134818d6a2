//! Connectivity waiter
//!
//! Blocks until an outbound probe succeeds. Meant for devices whose uplink
//! may come up after the process starts.

use crate::control::{Control, Stage};
use crate::error::Result;
use dropflow_cloud::ConnectivityProbe;
use std::time::Duration;

/// Probe every `delay` until connected. Returns the number of probes made.
///
/// Probe failures are never surfaced; only cancellation or the deadline in
/// `control` end the wait early.
pub async fn wait_until_connected<P>(probe: &P, delay: Duration, control: &Control) -> Result<u32>
where
    P: ConnectivityProbe + ?Sized,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        if control.guard(Stage::Connectivity, attempts, probe.probe()).await? {
            if attempts > 1 {
                tracing::info!("Network connectivity established after {} probes", attempts);
            }
            return Ok(attempts);
        }

        tracing::info!("No network connectivity, retrying in {:?}", delay);
        control.sleep(Stage::Connectivity, delay, attempts).await?;
    }
}
