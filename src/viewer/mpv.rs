//! External `mpv` process driven over its JSON IPC socket.
//!
//! One player process at a time: playing a different feed position replaces
//! the running process, while pause and mute changes for the current one go
//! through `--input-ipc-server`.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::json;
use url::Url;

use super::playback::{MediaBackend, PlaybackError};

struct MpvProcess {
    index: usize,
    child: Child,
    ipc_path: PathBuf,
}

impl MpvProcess {
    fn send(&self, command: serde_json::Value) -> Result<(), PlaybackError> {
        let payload = json!({ "command": command });
        send_ipc(&self.ipc_path, &payload.to_string())
    }

    fn stop(mut self) {
        if let Err(err) = self.child.kill() {
            tracing::debug!(error = %err, "mpv already exited");
        }
        if let Err(err) = self.child.wait() {
            tracing::debug!(error = %err, "Failed to reap mpv");
        }
        cleanup_ipc_path(&self.ipc_path);
    }
}

pub struct MpvBackend {
    mpv_path: String,
    current: Option<MpvProcess>,
}

impl MpvBackend {
    pub fn new(mpv_path: impl Into<String>) -> Self {
        Self {
            mpv_path: mpv_path.into(),
            current: None,
        }
    }

    fn current_for(&mut self, index: usize) -> Option<&mut MpvProcess> {
        self.current.as_mut().filter(|p| p.index == index)
    }

    fn spawn(&self, index: usize, url: &Url, muted: bool) -> Result<MpvProcess, PlaybackError> {
        let ipc_path = unique_ipc_path();
        cleanup_ipc_path(&ipc_path);

        let mut command = Command::new(&self.mpv_path);
        command
            .arg("--force-window=yes")
            .arg("--loop-file=inf")
            .arg("--really-quiet")
            .arg("--no-terminal")
            .arg(format!("--mute={}", if muted { "yes" } else { "no" }))
            .arg(format!("--input-ipc-server={}", ipc_path.display()))
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = command.spawn().map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                PlaybackError::Unavailable(format!("{} not found", self.mpv_path))
            } else {
                PlaybackError::Failed(format!("launch {}: {err}", self.mpv_path))
            }
        })?;
        tracing::debug!(index, %url, muted, pid = child.id(), "Spawned mpv");

        Ok(MpvProcess {
            index,
            child,
            ipc_path,
        })
    }
}

impl MediaBackend for MpvBackend {
    fn play(&mut self, index: usize, url: &Url, muted: bool) -> Result<(), PlaybackError> {
        if let Some(process) = self.current_for(index) {
            if matches!(process.child.try_wait(), Ok(None)) {
                process.send(json!(["set_property", "mute", muted]))?;
                return process.send(json!(["set_property", "pause", false]));
            }
        }
        if let Some(old) = self.current.take() {
            old.stop();
        }
        self.current = Some(self.spawn(index, url, muted)?);
        Ok(())
    }

    fn pause(&mut self, index: usize) -> Result<(), PlaybackError> {
        match self.current_for(index) {
            Some(process) => process.send(json!(["set_property", "pause", true])),
            None => Ok(()),
        }
    }

    fn set_muted(&mut self, index: usize, muted: bool) -> Result<(), PlaybackError> {
        match self.current_for(index) {
            Some(process) => process.send(json!(["set_property", "mute", muted])),
            None => Ok(()),
        }
    }

    fn stop_all(&mut self) {
        if let Some(process) = self.current.take() {
            process.stop();
        }
    }
}

impl Drop for MpvBackend {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn unique_ipc_path() -> PathBuf {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    let mut path = std::env::temp_dir();
    path.push(format!("reelfeed-mpv-{}-{suffix}.sock", std::process::id()));
    path
}

#[cfg(unix)]
fn send_ipc(path: &std::path::Path, serialized: &str) -> Result<(), PlaybackError> {
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    let mut stream = UnixStream::connect(path)
        .map_err(|e| PlaybackError::Failed(format!("connect to mpv IPC socket: {e}")))?;
    stream
        .write_all(serialized.as_bytes())
        .and_then(|()| stream.write_all(b"\n"))
        .map_err(|e| PlaybackError::Failed(format!("write mpv IPC command: {e}")))
}

#[cfg(not(unix))]
fn send_ipc(_path: &std::path::Path, _serialized: &str) -> Result<(), PlaybackError> {
    Err(PlaybackError::Unavailable(
        "mpv controls are not supported on this platform".to_string(),
    ))
}

fn cleanup_ipc_path(path: &std::path::Path) {
    if let Err(err) = std::fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), error = %err, "Failed to remove mpv IPC path");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_unavailable() {
        let mut backend = MpvBackend::new("/nonexistent/reelfeed-test-mpv");
        let url = Url::parse("http://localhost:5000/a.mp4").unwrap();
        let err = backend.play(0, &url, true).unwrap_err();
        assert!(matches!(err, PlaybackError::Unavailable(_)));
        assert!(backend.current.is_none());
    }

    #[test]
    fn test_controls_without_process_are_noops() {
        let mut backend = MpvBackend::new("mpv");
        assert_eq!(backend.pause(3), Ok(()));
        assert_eq!(backend.set_muted(3, false), Ok(()));
        backend.stop_all();
    }

    #[test]
    fn test_ipc_paths_are_unique() {
        let a = unique_ipc_path();
        let b = unique_ipc_path();
        assert_ne!(a, b);
        assert!(a.to_string_lossy().ends_with(".sock"));
    }
}
