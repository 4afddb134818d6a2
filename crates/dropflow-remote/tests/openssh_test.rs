//! OpenSSH driver tests using a stand-in `ssh` script.
#![cfg(unix)]

use dropflow_remote::{OpenSshShell, RemoteError, RemoteSession, RemoteShell, SshTarget};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Master mode succeeds, `-O` succeeds, anything else runs the last argument locally.
const FAKE_SSH_OK: &str = r#"#!/bin/sh
for a; do last="$a"; done
for a; do
  case "$a" in
    -M|-O) exit 0 ;;
  esac
done
exec /bin/sh -c "$last"
"#;

/// Writes a refused-connection diagnostic to the `-E` log and fails.
const FAKE_SSH_REFUSED: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  if [ "$1" = "-E" ]; then log="$2"; fi
  shift
done
echo "ssh: connect to host 203.0.113.10 port 22: Connection refused" > "$log"
exit 255
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn target(dir: &TempDir) -> SshTarget {
    let key = dir.path().join("id_rsa");
    std::fs::write(&key, "not a real key").unwrap();
    SshTarget::new("203.0.113.10", "root", key)
}

/// Command output and exit status come back through the master
#[tokio::test]
async fn test_exec_captures_output_and_status() {
    let dir = TempDir::new().unwrap();
    let program = write_script(dir.path(), "ssh", FAKE_SSH_OK);
    let shell = OpenSshShell::new().with_program(program);

    let mut session = shell.connect(&target(&dir)).await.unwrap();
    let output = session
        .exec("echo hello; echo oops >&2; exit 3")
        .await
        .unwrap();

    assert_eq!(output.stdout.trim(), "hello");
    assert_eq!(output.stderr.trim(), "oops");
    assert_eq!(output.exit_status, 3);
    assert!(!output.success());

    session.close().await.unwrap();
    assert!(matches!(
        session.exec("true").await,
        Err(RemoteError::SessionClosed)
    ));
}

/// Refused connections are reported as transient
#[tokio::test]
async fn test_connect_failure_is_classified() {
    let dir = TempDir::new().unwrap();
    let program = write_script(dir.path(), "ssh", FAKE_SSH_REFUSED);
    let shell = OpenSshShell::new().with_program(program);

    let err = shell.connect(&target(&dir)).await.err().unwrap();

    assert!(matches!(err, RemoteError::ConnectionRefused(_)), "got {err:?}");
    assert!(err.is_transient());
}

/// An unreadable key fails without starting ssh
#[tokio::test]
async fn test_missing_key_fails_before_spawning() {
    let dir = TempDir::new().unwrap();
    let shell = OpenSshShell::new().with_program(dir.path().join("does-not-exist"));
    let target = SshTarget::new("203.0.113.10", "root", dir.path().join("missing_key"));

    let err = shell.connect(&target).await.err().unwrap();

    assert!(matches!(err, RemoteError::KeyUnreadable { .. }));
}

/// Exit status 255 during exec is a transport error
#[tokio::test]
async fn test_transport_failure_during_exec_is_error() {
    let dir = TempDir::new().unwrap();
    let program = write_script(dir.path(), "ssh", FAKE_SSH_OK);
    let shell = OpenSshShell::new().with_program(program);

    let mut session = shell.connect(&target(&dir)).await.unwrap();
    let err = session
        .exec("echo 'Connection closed by 203.0.113.10 port 22' >&2; exit 255")
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::ConnectionReset(_)));
}
