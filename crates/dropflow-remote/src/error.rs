//! Remote channel error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Connection refused by {0}")]
    ConnectionRefused(String),

    #[error("Connection to {0} timed out")]
    TimedOut(String),

    #[error("Host {0} is unreachable")]
    HostUnreachable(String),

    #[error("Connection to {0} was reset")]
    ConnectionReset(String),

    #[error("Authentication to {host} failed: {detail}")]
    AuthenticationFailed { host: String, detail: String },

    #[error("SSH protocol error: {0}")]
    Protocol(String),

    #[error("Private key {path} is not readable: {source}")]
    KeyUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run ssh client: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Session already closed")]
    SessionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    /// Classify ssh client diagnostics for a failed connection to `host`.
    pub fn classify(host: &str, diagnostics: &str) -> Self {
        let text = diagnostics.trim();
        let host = host.to_string();

        if text.contains("Permission denied") || text.contains("Too many authentication failures")
        {
            RemoteError::AuthenticationFailed {
                host,
                detail: last_line(text),
            }
        } else if text.contains("Connection refused") {
            RemoteError::ConnectionRefused(host)
        } else if text.contains("timed out") {
            RemoteError::TimedOut(host)
        } else if text.contains("No route to host")
            || text.contains("Network is unreachable")
            || text.contains("Could not resolve hostname")
        {
            RemoteError::HostUnreachable(host)
        } else if text.contains("Connection reset")
            || text.contains("closed by remote host")
            || text.contains("Connection closed by")
            || text.contains("kex_exchange_identification")
        {
            RemoteError::ConnectionReset(host)
        } else if text.is_empty() {
            RemoteError::Protocol(format!("ssh to {host} failed without diagnostics"))
        } else {
            RemoteError::Protocol(last_line(text))
        }
    }

    /// Failures expected while a fresh host is still booting.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::ConnectionRefused(_)
                | RemoteError::TimedOut(_)
                | RemoteError::HostUnreachable(_)
                | RemoteError::ConnectionReset(_)
        )
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, RemoteError::AuthenticationFailed { .. })
    }
}

fn last_line(text: &str) -> String {
    text.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or(text)
        .trim()
        .to_string()
}

pub type Result<T> = std::result::Result<T, RemoteError>;
