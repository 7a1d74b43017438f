//! PlayerController over a running mpv process.

use super::ipc::{MpvEvent, MpvIpc};
use async_trait::async_trait;
use moov_core::player::{CanonicalState, PlaybackStatus, PlayerController, Rgb};
use moov_core::{MoovError, Result};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::process::Child;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Script message name carrying a line the user typed at the player.
pub const INPUT_MESSAGE: &str = "moov-input";

const OVERLAY_DURATION_MS: u64 = 5000;
const QUIT_GRACE: Duration = Duration::from_secs(1);

/// What the event pump has learned since the last drain.
#[derive(Debug)]
pub(crate) struct EventState {
    inputs: Vec<String>,
    control_dirty: bool,
    last_command: Instant,
    /// A file is being loaded; seeks wait for `file-loaded`
    loading: bool,
    pending_seek: Option<f64>,
    shut_down: bool,
}

impl EventState {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            inputs: Vec::new(),
            control_dirty: false,
            last_command: now,
            loading: false,
            pending_seek: None,
            shut_down: false,
        }
    }

    /// Folds one event in. Returns a deferred seek that is now due.
    pub(crate) fn apply(
        &mut self,
        event: MpvEvent,
        now: Instant,
        echo_window: Duration,
    ) -> Option<f64> {
        match event {
            MpvEvent::PropertyChange { ref name, .. }
                if name == "pause" || name == "playlist-pos" =>
            {
                self.note_control_change(now, echo_window);
            }
            MpvEvent::Seek => self.note_control_change(now, echo_window),
            MpvEvent::ClientMessage { args } => {
                if args.first().map(String::as_str) == Some(INPUT_MESSAGE) {
                    let text = args[1..].join(" ");
                    let text = text.trim();
                    if !text.is_empty() {
                        self.inputs.push(text.to_string());
                    }
                }
            }
            MpvEvent::Other(name) if name == "file-loaded" => {
                self.loading = false;
                return self.pending_seek.take();
            }
            MpvEvent::Shutdown => self.shut_down = true,
            _ => {}
        }
        None
    }

    fn note_control_change(&mut self, now: Instant, echo_window: Duration) {
        if self.loading || now.saturating_duration_since(self.last_command) <= echo_window {
            return;
        }
        self.control_dirty = true;
    }
}

pub struct MpvPlayer {
    ipc: Arc<MpvIpc>,
    child: Mutex<Child>,
    socket_path: PathBuf,
    state: Arc<StdMutex<EventState>>,
    pump: JoinHandle<()>,
}

impl MpvPlayer {
    pub(crate) fn new(
        ipc: MpvIpc,
        child: Child,
        socket_path: PathBuf,
        events: mpsc::UnboundedReceiver<MpvEvent>,
        echo_window: Duration,
    ) -> Self {
        let ipc = Arc::new(ipc);
        let state = Arc::new(StdMutex::new(EventState::new(Instant::now())));
        let pump = tokio::spawn(pump_events(
            events,
            ipc.clone(),
            state.clone(),
            echo_window,
        ));
        Self {
            ipc,
            child: Mutex::new(child),
            socket_path,
            state,
            pump,
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut EventState) -> R) -> Result<R> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| MoovError::internal(e.to_string()))?;
        Ok(f(&mut state))
    }

    fn touch(&self) -> Result<()> {
        self.with_state(|s| s.last_command = Instant::now())
    }

    /// Issues a control command; changes it causes are not user changes.
    async fn control(&self, command: Vec<Value>) -> Result<()> {
        self.touch()?;
        let result = self.ipc.command_ok(command).await;
        self.touch()?;
        result.map(|_| ())
    }

    async fn control_property(&self, name: &str, value: Value) -> Result<()> {
        self.touch()?;
        let result = self.ipc.set_property(name, value).await;
        self.touch()?;
        result
    }

    async fn playlist_position(&self) -> Result<i64> {
        Ok(self
            .ipc
            .get_property("playlist-pos")
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(-1))
    }

    async fn load(&self, url: &str, mode: &str) -> Result<()> {
        if mode == "replace" {
            self.with_state(|s| {
                s.loading = true;
                s.pending_seek = None;
            })?;
        }
        self.control(vec![json!("loadfile"), json!(url), json!(mode)])
            .await
    }
}

async fn pump_events(
    mut events: mpsc::UnboundedReceiver<MpvEvent>,
    ipc: Arc<MpvIpc>,
    state: Arc<StdMutex<EventState>>,
    echo_window: Duration,
) {
    while let Some(event) = events.recv().await {
        let due = match state.lock() {
            Ok(mut s) => {
                let due = s.apply(event, Instant::now(), echo_window);
                if due.is_some() {
                    s.last_command = Instant::now();
                }
                due
            }
            Err(_) => break,
        };
        if let Some(seconds) = due {
            if let Err(e) = ipc
                .command_ok(vec![json!("seek"), json!(seconds), json!("absolute")])
                .await
            {
                tracing::warn!("Deferred seek to {} failed: {}", seconds, e);
            }
            if let Ok(mut s) = state.lock() {
                s.last_command = Instant::now();
            }
        }
    }
}

/// Wraps `text` in ASS colour overrides for `show-text`.
pub(crate) fn overlay_text(text: &str, foreground: Rgb, background: Rgb) -> String {
    // ASS colours are &HBBGGRR&; `$` starts a property expansion in show-text
    format!(
        "${{osd-ass-cc/0}}{{\\1c&H{:02X}{:02X}{:02X}&\\3c&H{:02X}{:02X}{:02X}&}}${{osd-ass-cc/1}}{}",
        foreground.b,
        foreground.g,
        foreground.r,
        background.b,
        background.g,
        background.r,
        text.replace('$', "$$")
    )
}

#[async_trait]
impl PlayerController for MpvPlayer {
    async fn open(&self, url: &str) -> Result<()> {
        tracing::info!(url, "Opening in mpv");
        self.load(url, "replace").await
    }

    async fn append(&self, url: &str) -> Result<()> {
        self.load(url, "append").await
    }

    async fn seek(&self, seconds: f64) -> Result<()> {
        let deferred = self.with_state(|s| {
            if s.loading {
                s.pending_seek = Some(seconds);
            }
            s.loading
        })?;
        if deferred {
            return Ok(());
        }
        self.control(vec![json!("seek"), json!(seconds), json!("absolute")])
            .await
    }

    async fn relative_seek(&self, delta: f64) -> Result<()> {
        self.control(vec![json!("seek"), json!(delta), json!("relative")])
            .await
    }

    async fn set_canonical(&self, state: CanonicalState) -> Result<()> {
        if self.playlist_position().await? != state.position as i64 {
            self.with_state(|s| s.loading = true)?;
            self.control_property("playlist-pos", json!(state.position))
                .await?;
        }
        self.control_property("pause", json!(state.paused)).await?;
        self.seek(state.time).await
    }

    async fn status(&self) -> Result<PlaybackStatus> {
        let position = self.playlist_position().await?;
        if position < 0 {
            return Err(MoovError::player("nothing loaded"));
        }
        let count = self
            .ipc
            .get_property("playlist-count")
            .await?
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let paused = self
            .ipc
            .get_property("pause")
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        // Unavailable while a file is still loading
        let time = match self.ipc.get_property("time-pos").await {
            Ok(value) => value.and_then(|v| v.as_f64()).unwrap_or(0.0),
            Err(_) => 0.0,
        };

        Ok(PlaybackStatus {
            playlist_position: position as usize,
            playlist_count: count as usize,
            paused,
            time,
        })
    }

    async fn toggle_paused(&self) -> Result<()> {
        self.control(vec![json!("cycle"), json!("pause")]).await
    }

    async fn alive(&self) -> bool {
        if self.with_state(|s| s.shut_down).unwrap_or(true) {
            return false;
        }
        matches!(self.child.lock().await.try_wait(), Ok(None))
    }

    async fn close(&self) -> Result<()> {
        let _ = tokio::time::timeout(QUIT_GRACE, self.ipc.command(vec![json!("quit")])).await;

        let mut child = self.child.lock().await;
        if let Ok(None) = child.try_wait() {
            if tokio::time::timeout(QUIT_GRACE, child.wait()).await.is_err() {
                tracing::warn!("mpv did not quit, killing it");
                child.kill().await?;
            }
        }
        let _ = std::fs::remove_file(&self.socket_path);
        self.with_state(|s| s.shut_down = true)?;
        tracing::info!("mpv closed");
        Ok(())
    }

    async fn put_message(&self, text: &str, foreground: Rgb, background: Rgb) {
        let command = vec![
            json!("show-text"),
            json!(overlay_text(text, foreground, background)),
            json!(OVERLAY_DURATION_MS),
        ];
        if let Err(e) = self.ipc.command_ok(command).await {
            tracing::debug!("Overlay message failed: {}", e);
        }
    }

    async fn drain_user_inputs(&self) -> Vec<String> {
        self.with_state(|s| std::mem::take(&mut s.inputs))
            .unwrap_or_default()
    }

    async fn drain_user_control_changes(&self) -> Vec<CanonicalState> {
        let dirty = self
            .with_state(|s| std::mem::replace(&mut s.control_dirty, false))
            .unwrap_or(false);
        if !dirty {
            return Vec::new();
        }
        match self.status().await {
            Ok(status) => vec![status.canonical()],
            Err(e) => {
                tracing::debug!("Could not read status after user change: {}", e);
                Vec::new()
            }
        }
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        self.pump.abort();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(750);

    fn pause_change() -> MpvEvent {
        MpvEvent::PropertyChange {
            name: "pause".to_string(),
            data: json!(true),
        }
    }

    #[test]
    fn test_changes_inside_echo_window_are_ours() {
        let start = Instant::now();
        let mut state = EventState::new(start);

        state.apply(pause_change(), start + Duration::from_millis(100), WINDOW);
        state.apply(MpvEvent::Seek, start + Duration::from_millis(700), WINDOW);
        assert!(!state.control_dirty);

        state.apply(MpvEvent::Seek, start + Duration::from_secs(2), WINDOW);
        assert!(state.control_dirty);
    }

    #[test]
    fn test_unrelated_property_is_ignored() {
        let start = Instant::now();
        let mut state = EventState::new(start);
        state.apply(
            MpvEvent::PropertyChange {
                name: "volume".to_string(),
                data: json!(50),
            },
            start + Duration::from_secs(5),
            WINDOW,
        );
        assert!(!state.control_dirty);
    }

    #[test]
    fn test_input_messages_are_queued() {
        let start = Instant::now();
        let mut state = EventState::new(start);
        state.apply(
            MpvEvent::ClientMessage {
                args: vec![INPUT_MESSAGE.to_string(), ".seek".to_string(), "1:00".to_string()],
            },
            start,
            WINDOW,
        );
        state.apply(
            MpvEvent::ClientMessage {
                args: vec!["other-script".to_string(), "x".to_string()],
            },
            start,
            WINDOW,
        );
        state.apply(
            MpvEvent::ClientMessage {
                args: vec![INPUT_MESSAGE.to_string(), "  ".to_string()],
            },
            start,
            WINDOW,
        );
        assert_eq!(state.inputs, vec![".seek 1:00".to_string()]);
    }

    #[test]
    fn test_deferred_seek_fires_on_file_loaded() {
        let start = Instant::now();
        let mut state = EventState::new(start);
        state.loading = true;
        state.pending_seek = Some(42.0);

        // User-looking changes while loading are not reported
        state.apply(pause_change(), start + Duration::from_secs(3), WINDOW);
        assert!(!state.control_dirty);

        let due = state.apply(
            MpvEvent::Other("file-loaded".to_string()),
            start + Duration::from_secs(3),
            WINDOW,
        );
        assert_eq!(due, Some(42.0));
        assert!(!state.loading);
        assert_eq!(state.pending_seek, None);
    }

    #[test]
    fn test_shutdown_marks_dead() {
        let mut state = EventState::new(Instant::now());
        state.apply(MpvEvent::Shutdown, Instant::now(), WINDOW);
        assert!(state.shut_down);
    }

    #[test]
    fn test_overlay_text_colours_and_escaping() {
        let text = overlay_text("bob: costs $5", Rgb::new(0x11, 0x22, 0x33), Rgb::BLACK);
        assert_eq!(
            text,
            "${osd-ass-cc/0}{\\1c&H332211&\\3c&H000000&}${osd-ass-cc/1}bob: costs $$5"
        );
    }
}
