//! Spawns mpv with an IPC socket and hands back a connected [`MpvPlayer`].

use super::ipc::MpvIpc;
use super::player::MpvPlayer;
use async_trait::async_trait;
use moov_core::config::PlayerConfig;
use moov_core::player::{PlayerController, PlayerLauncher};
use moov_core::{MoovError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

const SOCKET_POLL: Duration = Duration::from_millis(100);

/// Property observation ids; the values only need to be distinct.
const OBSERVED: [(u64, &str); 2] = [(1, "pause"), (2, "playlist-pos")];

pub struct MpvLauncher {
    config: PlayerConfig,
    runtime_dir: PathBuf,
    launches: AtomicU32,
}

impl MpvLauncher {
    pub fn new(config: PlayerConfig) -> Self {
        Self::with_runtime_dir(config, std::env::temp_dir())
    }

    /// Launcher that puts IPC sockets under `runtime_dir`.
    pub fn with_runtime_dir(config: PlayerConfig, runtime_dir: PathBuf) -> Self {
        Self {
            config,
            runtime_dir,
            launches: AtomicU32::new(0),
        }
    }

    fn next_socket_path(&self) -> PathBuf {
        let n = self.launches.fetch_add(1, Ordering::Relaxed);
        self.runtime_dir
            .join(format!("moov-mpv-{}-{}.sock", std::process::id(), n))
    }

    /// Arguments passed to mpv, configured ones first.
    pub fn arguments(&self, socket_path: &Path) -> Vec<String> {
        let mut args = self.config.args.clone();
        args.push("--idle=yes".to_string());
        args.push("--input-terminal=no".to_string());
        args.push(format!("--input-ipc-server={}", socket_path.display()));
        args
    }
}

#[async_trait]
impl PlayerLauncher for MpvLauncher {
    async fn launch(&self) -> Result<Arc<dyn PlayerController>> {
        let socket_path = self.next_socket_path();
        let _ = std::fs::remove_file(&socket_path);
        let args = self.arguments(&socket_path);

        tracing::info!(
            "Starting player: path={}, socket={}, args={:?}",
            self.config.binary,
            socket_path.display(),
            args
        );
        let mut child = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MoovError::player(format!("failed to start {}: {e}", self.config.binary)))?;

        wait_for_ipc_socket(&mut child, &socket_path, self.config.ipc_timeout()).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let ipc = MpvIpc::connect(&socket_path, self.config.ipc_timeout(), tx).await?;
        for (id, name) in OBSERVED {
            ipc.observe_property(id, name).await?;
        }

        Ok(Arc::new(MpvPlayer::new(
            ipc,
            child,
            socket_path,
            rx,
            self.config.echo_window(),
        )))
    }
}

async fn wait_for_ipc_socket(child: &mut Child, socket_path: &Path, timeout: Duration) -> Result<()> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if socket_path.exists() {
            return Ok(());
        }
        if let Ok(Some(status)) = child.try_wait() {
            return Err(MoovError::player(format!("player exited with status {status}")));
        }
        tokio::time::sleep(SOCKET_POLL).await;
    }
    let _ = child.kill().await;
    Err(MoovError::player("timed out waiting for the IPC socket"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_include_ipc_socket() {
        let launcher = MpvLauncher::new(PlayerConfig::default());
        let args = launcher.arguments(Path::new("/tmp/x.sock"));
        assert_eq!(args[0], "--force-window=yes");
        assert!(args.contains(&"--idle=yes".to_string()));
        assert_eq!(args.last().unwrap(), "--input-ipc-server=/tmp/x.sock");
    }

    #[test]
    fn test_socket_paths_are_unique() {
        let launcher =
            MpvLauncher::with_runtime_dir(PlayerConfig::default(), PathBuf::from("/run/moov"));
        let a = launcher.next_socket_path();
        let b = launcher.next_socket_path();
        assert_ne!(a, b);
        assert!(a.starts_with("/run/moov"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_player_error() {
        let launcher = MpvLauncher::new(PlayerConfig {
            binary: "/nonexistent/moov-test-mpv".to_string(),
            ..PlayerConfig::default()
        });
        let err = launcher.launch().await.err().unwrap();
        assert!(matches!(err, MoovError::Player(_)));
    }
}
