//! Remote shell traits

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub private_key: PathBuf,
}

impl SshTarget {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        private_key: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            private_key: private_key.into(),
        }
    }

    /// `user@host` form.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

impl fmt::Display for SshTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.destination(), self.port)
    }
}

/// Captured result of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Opens sessions to remote hosts.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    type Session: RemoteSession;

    /// One connection attempt. Retry policy belongs to the caller.
    async fn connect(&self, target: &SshTarget) -> Result<Self::Session>;
}

/// An open, single-use session.
#[async_trait]
pub trait RemoteSession: Send {
    /// Run `command` and wait for it to finish. A non-zero exit status is
    /// returned in [`CommandOutput`], not as an error.
    async fn exec(&mut self, command: &str) -> Result<CommandOutput>;

    /// Close the session. Further calls fail with `SessionClosed`.
    async fn close(&mut self) -> Result<()>;
}
