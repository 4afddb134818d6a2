use crate::control::Control;
use crate::error::{LifecycleError, Result};
use async_trait::async_trait;
use dropflow_cloud::ServerInstance;
use serde::Serialize;

/// start / stop / poll for the single managed server.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    async fn start(&self, control: &Control) -> Result<ServerInstance>;
    async fn stop(&self, control: &Control) -> Result<StopOutcome>;
    async fn poll(&self) -> Result<Option<ServerInstance>>;
}

/// How `stop` converged on "no instance".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped {
        instance_id: u64,
        terminated_pids: Vec<u32>,
    },
    /// Nothing to do.
    AlreadyStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Start,
    Stop,
    Status,
}

/// Externally observable result of one operation.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleOutcome {
    pub operation: Operation,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<ServerInstance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LifecycleOutcome {
    pub fn started(instance: ServerInstance) -> Self {
        Self::ok(Operation::Start, Some(instance), None)
    }

    pub fn stopped(outcome: StopOutcome) -> Self {
        Self::ok(Operation::Stop, None, Some(outcome))
    }

    pub fn status(instance: Option<ServerInstance>) -> Self {
        Self::ok(Operation::Status, instance, None)
    }

    pub fn failed(operation: Operation, error: &LifecycleError) -> Self {
        Self {
            operation,
            success: false,
            instance: None,
            stop: None,
            error_kind: Some(error.kind()),
            error: Some(error.to_string()),
        }
    }

    fn ok(operation: Operation, instance: Option<ServerInstance>, stop: Option<StopOutcome>) -> Self {
        Self {
            operation,
            success: true,
            instance,
            stop,
            error_kind: None,
            error: None,
        }
    }
}
