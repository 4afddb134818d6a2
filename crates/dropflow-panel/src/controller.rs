//! Front-end controller
//!
//! Mirrors the server's real state onto the indicator and turns a trigger
//! into exactly one `start` or `stop`. Callers serialize access (see
//! [`crate::button`]); the controller itself is a plain `&mut self` state
//! machine.

use crate::indicator::{Indicator, IndicatorState};
use dropflow_cloud::ConnectivityProbe;
use dropflow_lifecycle::{Control, Lifecycle, wait_until_connected};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Off,
    On,
    Transitioning,
}

impl PanelState {
    pub fn indicator(self) -> IndicatorState {
        match self {
            PanelState::Off => IndicatorState::Off,
            PanelState::On => IndicatorState::On,
            PanelState::Transitioning => IndicatorState::Flashing,
        }
    }
}

pub struct Controller<L, I> {
    lifecycle: L,
    indicator: I,
    state: PanelState,
}

impl<L, I> Controller<L, I>
where
    L: Lifecycle,
    I: Indicator,
{
    pub fn new(lifecycle: L, indicator: I) -> Self {
        Self {
            lifecycle,
            indicator,
            state: PanelState::Off,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    async fn set(&mut self, state: PanelState) {
        self.state = state;
        self.indicator.set_state(state.indicator()).await;
    }

    /// Wait for the network, then mirror whether an instance exists.
    pub async fn reconcile<P>(&mut self, probe: &P, retry: Duration, control: &Control) -> PanelState
    where
        P: ConnectivityProbe + ?Sized,
    {
        self.set(PanelState::Transitioning).await;

        if let Err(e) = wait_until_connected(probe, retry, control).await {
            tracing::warn!("Gave up waiting for connectivity: {}", e);
            self.set(PanelState::Off).await;
            return self.state;
        }

        self.mirror_real_state().await;
        self.state
    }

    /// Start when off, stop when on. Ignored while transitioning.
    pub async fn toggle(&mut self, control: &Control) -> PanelState {
        match self.state {
            PanelState::Transitioning => {
                tracing::debug!("Operation in flight, trigger ignored");
            }
            PanelState::Off => {
                self.set(PanelState::Transitioning).await;
                match self.lifecycle.start(control).await {
                    Ok(instance) => {
                        tracing::info!("Server {} started", instance.id);
                        self.set(PanelState::On).await;
                    }
                    Err(e) => {
                        tracing::error!("Start failed: {}", e);
                        self.mirror_real_state().await;
                    }
                }
            }
            PanelState::On => {
                self.set(PanelState::Transitioning).await;
                match self.lifecycle.stop(control).await {
                    Ok(outcome) => {
                        tracing::info!("Server stopped: {:?}", outcome);
                        self.set(PanelState::Off).await;
                    }
                    Err(e) => {
                        tracing::error!("Stop failed: {}", e);
                        self.mirror_real_state().await;
                    }
                }
            }
        }
        self.state
    }

    /// Show `on` if an instance exists. Falls back to `off` if polling fails.
    async fn mirror_real_state(&mut self) {
        let state = match self.lifecycle.poll().await {
            Ok(Some(_)) => PanelState::On,
            Ok(None) => PanelState::Off,
            Err(e) => {
                tracing::warn!("Polling server state failed: {}", e);
                PanelState::Off
            }
        };
        self.set(state).await;
    }
}
