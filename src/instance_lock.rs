//! Per-client-id instance lock using a Unix socket.
//!
//! An MQTT broker drops the older session when a second connection arrives
//! with the same client id, so two sensors sharing an id would kick each
//! other off forever. The lock makes the second process on a host fail fast
//! instead. The OS releases the socket when the holder dies.

use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for instance lock operations.
#[derive(Debug, Error)]
pub enum InstanceLockError {
    /// Another process already publishes with this client id.
    #[error("another sensor with client id {0:?} is already running")]
    AlreadyRunning(String),

    /// I/O error during lock acquisition.
    #[error("failed to acquire instance lock: {0}")]
    Io(#[from] io::Error),
}

/// Lock held for the lifetime of the value; the socket file is removed on drop.
pub struct InstanceLock {
    _listener: UnixListener,
    path: PathBuf,
}

impl InstanceLock {
    /// Acquire the lock for `client_id` in the runtime directory.
    pub fn acquire(client_id: &str) -> Result<Self, InstanceLockError> {
        Self::acquire_in(&runtime_dir(), client_id)
    }

    /// Acquire the lock for `client_id` with the socket placed under `dir`.
    pub fn acquire_in(dir: &Path, client_id: &str) -> Result<Self, InstanceLockError> {
        let path = dir.join(socket_name(client_id));

        // A socket nobody answers on was left behind by a killed process
        if path.exists() {
            if UnixStream::connect(&path).is_ok() {
                return Err(InstanceLockError::AlreadyRunning(client_id.to_string()));
            }
            let _ = std::fs::remove_file(&path);
        }

        match UnixListener::bind(&path) {
            Ok(listener) => Ok(Self {
                _listener: listener,
                path,
            }),
            // Another instance bound between our check and bind
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                Err(InstanceLockError::AlreadyRunning(client_id.to_string()))
            }
            Err(e) => Err(InstanceLockError::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// `$XDG_RUNTIME_DIR`, falling back to `/tmp`.
fn runtime_dir() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Socket file name for a client id, with path-hostile characters replaced.
fn socket_name(client_id: &str) -> String {
    let safe: String = client_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("engine-temp-sensor-{safe}.sock")
}
