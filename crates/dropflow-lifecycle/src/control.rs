//! Cancellation, deadlines and retry bounds for the waiting loops.

use crate::error::{LifecycleError, Result};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// The blocking phases an operation can be stopped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Connectivity,
    InstanceActive,
    SessionConnect,
    ProcessExit,
    Poll,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Connectivity => "waiting for network connectivity",
            Stage::InstanceActive => "waiting for the instance to become active",
            Stage::SessionConnect => "connecting to the instance",
            Stage::ProcessExit => "waiting for the server process to exit",
            Stage::Poll => "querying server state",
        };
        f.write_str(name)
    }
}

/// Per-call control threaded through every loop: a cancellation token plus
/// an optional overall deadline.
#[derive(Debug, Clone, Default)]
pub struct Control {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Control {
    /// Unbounded and never cancelled unless the token is triggered.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Set the deadline `timeout` from now. A timeout too large to represent
    /// leaves the control unbounded.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    /// Apply an optional timeout.
    pub fn with_optional_timeout(self, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(t) => self.with_timeout(t),
            None => self,
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail if the operation was cancelled or its deadline has passed.
    pub fn check(&self, stage: Stage, attempts: u32) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(LifecycleError::Cancelled { stage });
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(LifecycleError::TimedOut { stage, attempts });
        }
        Ok(())
    }

    /// Sleep for `delay` unless cancelled or the deadline arrives first.
    pub async fn sleep(&self, stage: Stage, delay: Duration, attempts: u32) -> Result<()> {
        self.check(stage, attempts)?;

        let wake = Instant::now() + delay;
        let (until, expires) = match self.deadline {
            Some(d) if d < wake => (d, true),
            _ => (wake, false),
        };

        tokio::select! {
            _ = self.cancel.cancelled() => Err(LifecycleError::Cancelled { stage }),
            _ = tokio::time::sleep_until(until) => {
                if expires {
                    Err(LifecycleError::TimedOut { stage, attempts })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Run `fut` unless cancelled or the deadline arrives first.
    pub async fn guard<F>(&self, stage: Stage, attempts: u32, fut: F) -> Result<F::Output>
    where
        F: Future,
    {
        self.check(stage, attempts)?;

        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = self.cancel.cancelled() => Err(LifecycleError::Cancelled { stage }),
            _ = deadline => Err(LifecycleError::TimedOut { stage, attempts }),
            out = fut => Ok(out),
        }
    }
}

/// Fixed-delay retry with an optional attempt cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Whether another attempt may follow `attempts` made so far.
    pub fn allows_another(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }
}
