//! Remote command channel for dropflow
//!
//! A [`RemoteShell`] opens authenticated [`RemoteSession`]s to a host; a
//! session runs commands strictly one after another and is closed when the
//! caller is done with it.
//!
//! # Requirements
//!
//! - An OpenSSH client (`ssh`) on `PATH` for [`OpenSshShell`]
//! - A private key whose public half is installed on the target
//!
//! # Example
//!
//! ```ignore
//! use dropflow_remote::{OpenSshShell, RemoteSession, RemoteShell, SshTarget};
//!
//! let shell = OpenSshShell::new();
//! let target = SshTarget::new("203.0.113.10", "root", "/home/pi/.ssh/id_rsa");
//!
//! let mut session = shell.connect(&target).await?;
//! let output = session.exec("uptime").await?;
//! session.close().await?;
//! ```

pub mod error;
pub mod openssh;
pub mod session;

pub use error::{RemoteError, Result};
pub use openssh::OpenSshShell;
pub use session::{CommandOutput, RemoteSession, RemoteShell, SshTarget};
