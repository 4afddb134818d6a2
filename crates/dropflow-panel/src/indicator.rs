//! Lightbox indicator
//!
//! The lightbox has a single mode input; every pulse advances it one step
//! through `off -> on -> flashing -> off`. The driver tracks the mode it
//! believes the box is in and pulses the minimum number of times.

use crate::hardware::OutputPin;
use async_trait::async_trait;
use std::time::Duration;

pub const PULSE_WIDTH: Duration = Duration::from_millis(100);
pub const PULSE_COOLDOWN: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    Off,
    On,
    Flashing,
}

impl IndicatorState {
    fn next(self) -> Self {
        match self {
            IndicatorState::Off => IndicatorState::On,
            IndicatorState::On => IndicatorState::Flashing,
            IndicatorState::Flashing => IndicatorState::Off,
        }
    }
}

#[async_trait]
pub trait Indicator: Send {
    async fn set_state(&mut self, state: IndicatorState);
}

pub struct CyclingIndicator<P> {
    pin: P,
    current: IndicatorState,
    pulse_width: Duration,
    cooldown: Duration,
}

impl<P: OutputPin> CyclingIndicator<P> {
    /// Assumes the lightbox starts in `Off`.
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            current: IndicatorState::Off,
            pulse_width: PULSE_WIDTH,
            cooldown: PULSE_COOLDOWN,
        }
    }

    pub fn current(&self) -> IndicatorState {
        self.current
    }

    /// Pulses needed to move from `from` to `to`.
    pub fn pulses_between(from: IndicatorState, to: IndicatorState) -> u32 {
        let mut state = from;
        let mut pulses = 0;
        while state != to {
            state = state.next();
            pulses += 1;
        }
        pulses
    }

    async fn pulse(&mut self) {
        self.pin.set_high();
        tokio::time::sleep(self.pulse_width).await;
        self.pin.set_low();
        tokio::time::sleep(self.cooldown).await;
        self.current = self.current.next();
    }
}

#[async_trait]
impl<P: OutputPin> Indicator for CyclingIndicator<P> {
    async fn set_state(&mut self, state: IndicatorState) {
        if state != self.current {
            tracing::info!("Lightbox {:?} -> {:?}", self.current, state);
        }
        while self.current != state {
            self.pulse().await;
        }
    }
}
