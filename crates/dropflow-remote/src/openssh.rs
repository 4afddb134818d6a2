//! OpenSSH client driver
//!
//! Each session is a `ControlMaster` connection on a private socket; every
//! `exec` is a short-lived `ssh -S <socket>` client multiplexed over it, so
//! authentication happens once per session.

use crate::error::{RemoteError, Result};
use crate::session::{CommandOutput, RemoteSession, RemoteShell, SshTarget};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Exit status the ssh client uses for its own failures.
const SSH_TRANSPORT_FAILURE: i32 = 255;

/// [`RemoteShell`] backed by the system `ssh` binary.
#[derive(Debug, Clone)]
pub struct OpenSshShell {
    program: PathBuf,
    connect_timeout: Duration,
}

impl Default for OpenSshShell {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenSshShell {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ssh"),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Use another client binary.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Arguments that start a backgrounded master for `target`.
    fn master_args(&self, target: &SshTarget, socket: &Path, log: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-M".into(), "-f".into(), "-N".into()];
        args.push("-S".into());
        args.push(socket.into());
        args.push("-E".into());
        args.push(log.into());
        args.push("-p".into());
        args.push(target.port.to_string().into());
        args.push("-i".into());
        args.push(target.private_key.as_os_str().into());
        for option in [
            "BatchMode=yes".to_string(),
            "IdentitiesOnly=yes".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
            "ServerAliveInterval=15".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
        ] {
            args.push("-o".into());
            args.push(option.into());
        }
        args.push(target.destination().into());
        args
    }
}

#[async_trait]
impl RemoteShell for OpenSshShell {
    type Session = OpenSshSession;

    async fn connect(&self, target: &SshTarget) -> Result<OpenSshSession> {
        tokio::fs::File::open(&target.private_key)
            .await
            .map_err(|source| RemoteError::KeyUnreadable {
                path: target.private_key.clone(),
                source,
            })?;

        let dir = tempfile::Builder::new()
            .prefix("dropflow-ssh-")
            .tempdir()?;
        let socket = dir.path().join("master");
        let log = dir.path().join("connect.log");

        tracing::debug!("Opening ssh master to {}", target);
        let status = Command::new(&self.program)
            .args(self.master_args(target, &socket, &log))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(RemoteError::Spawn)?;

        if !status.success() {
            let diagnostics = tokio::fs::read_to_string(&log).await.unwrap_or_default();
            return Err(RemoteError::classify(&target.host, &diagnostics));
        }

        Ok(OpenSshSession {
            program: self.program.clone(),
            host: target.host.clone(),
            destination: target.destination(),
            socket,
            dir: Some(dir),
        })
    }
}

/// An open master connection.
pub struct OpenSshSession {
    program: PathBuf,
    host: String,
    destination: String,
    socket: PathBuf,
    /// Holds the socket directory; `None` once closed.
    dir: Option<TempDir>,
}

impl OpenSshSession {
    fn client(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-S")
            .arg(&self.socket)
            .arg("-o")
            .arg("BatchMode=yes")
            .stdin(Stdio::null());
        cmd
    }
}

#[async_trait]
impl RemoteSession for OpenSshSession {
    async fn exec(&mut self, command: &str) -> Result<CommandOutput> {
        if self.dir.is_none() {
            return Err(RemoteError::SessionClosed);
        }

        tracing::debug!("[{}] $ {}", self.host, command);
        let output = self
            .client()
            .arg(&self.destination)
            .arg("--")
            .arg(command)
            .output()
            .await
            .map_err(RemoteError::Spawn)?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_status = output.status.code().unwrap_or(SSH_TRANSPORT_FAILURE);
        if exit_status == SSH_TRANSPORT_FAILURE {
            return Err(RemoteError::classify(&self.host, &stderr));
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr,
            exit_status,
        })
    }

    async fn close(&mut self) -> Result<()> {
        let Some(dir) = self.dir.take() else {
            return Err(RemoteError::SessionClosed);
        };

        let status = self
            .client()
            .arg("-O")
            .arg("exit")
            .arg(&self.destination)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(RemoteError::Spawn)?;
        if !status.success() {
            tracing::warn!("ssh master to {} did not acknowledge exit", self.host);
        }

        drop(dir);
        Ok(())
    }
}

impl Drop for OpenSshSession {
    fn drop(&mut self) {
        if self.dir.is_some() {
            let _ = std::process::Command::new(&self.program)
                .arg("-S")
                .arg(&self.socket)
                .arg("-O")
                .arg("exit")
                .arg(&self.destination)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
        }
    }
}
