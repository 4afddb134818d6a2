//! Button polling and the single lifecycle worker.

use crate::controller::Controller;
use crate::hardware::InputPin;
use crate::indicator::Indicator;
use dropflow_lifecycle::{Control, Lifecycle};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

pub const BUTTON_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `pin` and forward each low-to-high edge as one press.
///
/// Presses are dropped while `busy` is set or a press is already queued.
pub async fn watch_button<P: InputPin>(
    pin: P,
    interval: Duration,
    presses: mpsc::Sender<()>,
    busy: Arc<AtomicBool>,
    cancel: CancellationToken,
) -> u32 {
    let mut was_high = pin.is_high();
    let mut forwarded = 0;
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return forwarded,
            _ = ticker.tick() => {}
        }

        let high = pin.is_high();
        let rising = high && !was_high;
        was_high = high;
        if !rising {
            continue;
        }

        if busy.load(Ordering::SeqCst) {
            tracing::info!("Button pressed while busy, ignored");
            continue;
        }
        match presses.try_send(()) {
            Ok(()) => {
                tracing::info!("Button pressed");
                forwarded += 1;
            }
            Err(TrySendError::Full(())) => tracing::info!("Button press already queued, ignored"),
            Err(TrySendError::Closed(())) => return forwarded,
        }
    }
}

/// Timing for [`run`].
#[derive(Debug, Clone)]
pub struct PanelOptions {
    pub poll_interval: Duration,
    pub connectivity_retry: Duration,
    /// Deadline applied to each start/stop.
    pub operation_timeout: Option<Duration>,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            poll_interval: BUTTON_POLL_INTERVAL,
            connectivity_retry: Duration::from_secs(3),
            operation_timeout: None,
        }
    }
}

/// Reconcile, then serve button presses one at a time until cancelled.
pub async fn run<L, I, P, B>(
    mut controller: Controller<L, I>,
    probe: &B,
    button: P,
    options: PanelOptions,
    cancel: CancellationToken,
) where
    L: Lifecycle,
    I: Indicator,
    P: InputPin + 'static,
    B: dropflow_cloud::ConnectivityProbe + ?Sized,
{
    let startup = Control::with_cancellation(cancel.child_token());
    let state = controller
        .reconcile(probe, options.connectivity_retry, &startup)
        .await;
    tracing::info!("Panel ready, server is {:?}", state);

    let (tx, mut rx) = mpsc::channel(1);
    let busy = Arc::new(AtomicBool::new(false));
    let watcher = tokio::spawn(watch_button(
        button,
        options.poll_interval,
        tx,
        busy.clone(),
        cancel.child_token(),
    ));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            press = rx.recv() => {
                if press.is_none() {
                    break;
                }
                busy.store(true, Ordering::SeqCst);
                let control = Control::with_cancellation(cancel.child_token())
                    .with_optional_timeout(options.operation_timeout);
                let state = controller.toggle(&control).await;
                tracing::info!("Server is {:?}", state);
                busy.store(false, Ordering::SeqCst);
            }
        }
    }

    cancel.cancel();
    if let Err(e) = watcher.await {
        tracing::warn!("Button watcher ended abnormally: {}", e);
    }
}
