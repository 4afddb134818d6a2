use crate::control::Stage;
use dropflow_cloud::CloudError;
use dropflow_remote::RemoteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(
        "DNS A record '{fqdn}' not found\n\nHint:\n  • Create the record once in the DNS zone; dropflow only updates its address"
    )]
    DnsRecordNotFound { fqdn: String },

    #[error("Instance {id} no longer exists")]
    InstanceNotFound { id: u64 },

    #[error("Instance {id} is active but has no public IPv4 address")]
    MissingAddress { id: u64 },

    #[error("Timed out {stage} (after {attempts} attempts)")]
    TimedOut { stage: Stage, attempts: u32 },

    #[error("Cancelled while {stage}")]
    Cancelled { stage: Stage },

    #[error("Remote step '{step}' failed with exit status {status}: {stderr}")]
    RemoteCommandFailed {
        step: String,
        status: i32,
        stderr: String,
    },

    #[error("Cloud API error: {0}")]
    Cloud(#[from] CloudError),

    #[error("Remote shell error: {0}")]
    Remote(#[from] RemoteError),
}

impl LifecycleError {
    /// A resource the operation depends on does not exist.
    pub fn is_missing_precondition(&self) -> bool {
        matches!(
            self,
            LifecycleError::DnsRecordNotFound { .. }
                | LifecycleError::InstanceNotFound { .. }
                | LifecycleError::MissingAddress { .. }
        )
    }

    /// Short machine-readable kind for structured output.
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleError::DnsRecordNotFound { .. } => "dns_record_not_found",
            LifecycleError::InstanceNotFound { .. } => "instance_not_found",
            LifecycleError::MissingAddress { .. } => "missing_address",
            LifecycleError::TimedOut { .. } => "timed_out",
            LifecycleError::Cancelled { .. } => "cancelled",
            LifecycleError::RemoteCommandFailed { .. } => "remote_command_failed",
            LifecycleError::Cloud(_) => "cloud",
            LifecycleError::Remote(_) => "remote",
        }
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
