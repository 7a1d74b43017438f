//! Hand-written collaborators for driving the engine in tests.

#![allow(dead_code)]

use async_trait::async_trait;
use moov_application::{Collaborators, EngineHandle, SyncEngine};
use moov_core::config::MoovConfig;
use moov_core::conversation::{ConversationSink, InboundMessage, OutgoingMessage};
use moov_core::player::{
    CanonicalState, PlaybackStatus, PlayerController, PlayerLauncher, Rgb,
};
use moov_core::resolver::MetadataResolver;
use moov_core::session::{
    MemorySessionRepository, Session, SessionRepository, SessionStore, VideoInfo,
};
use moov_core::{MoovError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Records what the engine sends. An echoing sink stands for a host that
/// hands sent lines back as local messages.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<OutgoingMessage>>,
    echoes: bool,
}

impl RecordingSink {
    pub fn echoing() -> Self {
        Self {
            echoes: true,
            ..Self::default()
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.text.clone()).collect()
    }

    pub fn messages(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.texts().last().cloned()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl ConversationSink for RecordingSink {
    async fn send(&self, message: OutgoingMessage) {
        self.sent.lock().unwrap().push(message);
    }

    fn echoes_sent(&self) -> bool {
        self.echoes
    }
}

#[derive(Debug, Default)]
pub struct PlayerState {
    pub playlist: Vec<String>,
    pub position: usize,
    pub paused: bool,
    pub time: f64,
    pub alive: bool,
    pub closed: bool,
    pub overlays: Vec<(String, Rgb)>,
    pub inputs: Vec<String>,
    pub changes: Vec<CanonicalState>,
    pub set_calls: usize,
}

/// A player that just keeps its state in memory.
pub struct ScriptedPlayer {
    pub state: Mutex<PlayerState>,
}

impl ScriptedPlayer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlayerState {
                alive: true,
                ..PlayerState::default()
            }),
        }
    }

    pub fn url(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.playlist.get(state.position).cloned()
    }

    pub fn time(&self) -> f64 {
        self.state.lock().unwrap().time
    }

    pub fn paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    pub fn closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn position(&self) -> usize {
        self.state.lock().unwrap().position
    }

    pub fn set_calls(&self) -> usize {
        self.state.lock().unwrap().set_calls
    }

    pub fn overlays(&self) -> Vec<(String, Rgb)> {
        self.state.lock().unwrap().overlays.clone()
    }

    /// The user seeks/pauses at the player itself.
    pub fn user_changes(&self, paused: bool, time: f64) {
        let mut state = self.state.lock().unwrap();
        state.paused = paused;
        state.time = time;
        let change = CanonicalState {
            position: state.position,
            paused,
            time,
        };
        state.changes.push(change);
    }

    pub fn user_types(&self, text: &str) {
        self.state.lock().unwrap().inputs.push(text.to_string());
    }

    /// The process goes away on its own.
    pub fn die(&self) {
        self.state.lock().unwrap().alive = false;
    }

    pub fn play_for(&self, seconds: f64) {
        self.state.lock().unwrap().time += seconds;
    }
}

#[async_trait]
impl PlayerController for ScriptedPlayer {
    async fn open(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.playlist = vec![url.to_string()];
        state.position = 0;
        state.time = 0.0;
        state.paused = false;
        Ok(())
    }

    async fn append(&self, url: &str) -> Result<()> {
        self.state.lock().unwrap().playlist.push(url.to_string());
        Ok(())
    }

    async fn seek(&self, seconds: f64) -> Result<()> {
        self.state.lock().unwrap().time = seconds;
        Ok(())
    }

    async fn relative_seek(&self, delta: f64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.time = (state.time + delta).max(0.0);
        Ok(())
    }

    async fn set_canonical(&self, canonical: CanonicalState) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.position = canonical.position;
        state.paused = canonical.paused;
        state.time = canonical.time;
        state.set_calls += 1;
        Ok(())
    }

    async fn status(&self) -> Result<PlaybackStatus> {
        let state = self.state.lock().unwrap();
        if state.playlist.is_empty() {
            return Err(MoovError::player("nothing loaded"));
        }
        Ok(PlaybackStatus {
            playlist_position: state.position,
            playlist_count: state.playlist.len(),
            paused: state.paused,
            time: state.time,
        })
    }

    async fn toggle_paused(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.paused = !state.paused;
        Ok(())
    }

    async fn alive(&self) -> bool {
        self.state.lock().unwrap().alive
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.alive = false;
        state.closed = true;
        Ok(())
    }

    async fn put_message(&self, text: &str, foreground: Rgb, _background: Rgb) {
        self.state
            .lock()
            .unwrap()
            .overlays
            .push((text.to_string(), foreground));
    }

    async fn drain_user_inputs(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().unwrap().inputs)
    }

    async fn drain_user_control_changes(&self) -> Vec<CanonicalState> {
        std::mem::take(&mut self.state.lock().unwrap().changes)
    }
}

#[derive(Default)]
pub struct MockLauncher {
    launched: Mutex<Vec<Arc<ScriptedPlayer>>>,
    fail: Mutex<bool>,
}

impl MockLauncher {
    pub fn launched(&self) -> Vec<Arc<ScriptedPlayer>> {
        self.launched.lock().unwrap().clone()
    }

    pub fn current(&self) -> Arc<ScriptedPlayer> {
        self.launched().last().cloned().expect("no player launched")
    }

    pub fn fail_next(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl PlayerLauncher for MockLauncher {
    async fn launch(&self) -> Result<Arc<dyn PlayerController>> {
        if *self.fail.lock().unwrap() {
            return Err(MoovError::player("no such binary"));
        }
        let player = Arc::new(ScriptedPlayer::new());
        self.launched.lock().unwrap().push(player.clone());
        Ok(player)
    }
}

/// Resolves from a fixed table; a gated URL waits until released.
#[derive(Default)]
pub struct MockResolver {
    known: Mutex<HashMap<String, VideoInfo>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl MockResolver {
    pub fn knows(&self, info: VideoInfo) {
        self.known.lock().unwrap().insert(info.url.clone(), info);
    }

    pub fn gate(&self, url: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(url.to_string(), Arc::new(Notify::new()));
    }

    pub fn release(&self, url: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(url) {
            gate.notify_one();
        }
    }
}

#[async_trait]
impl MetadataResolver for MockResolver {
    async fn resolve(&self, url: &str) -> Result<VideoInfo> {
        let gate = self.gates.lock().unwrap().get(url).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.known
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| MoovError::resolution(url, "unsupported URL"))
    }
}

/// In-memory repository whose saves can be made to fail.
#[derive(Default)]
pub struct FlakyRepository {
    inner: MemorySessionRepository,
    failing: AtomicBool,
}

impl FlakyRepository {
    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        Self {
            inner: MemorySessionRepository::with_sessions(sessions),
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_saves(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<Session> {
        self.inner.snapshot()
    }
}

#[async_trait]
impl SessionRepository for FlakyRepository {
    async fn load_all(&self) -> Result<Vec<Session>> {
        self.inner.load_all().await
    }

    async fn save_all(&self, sessions: &[Session]) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MoovError::io("disk full"));
        }
        self.inner.save_all(sessions).await
    }
}

pub fn cats() -> VideoInfo {
    VideoInfo::new("http://x", "Cats")
        .with_uploader("U")
        .with_uploader_url("http://u")
}

pub fn dogs() -> VideoInfo {
    VideoInfo::new("http://y", "Dogs").with_uploader("V")
}

pub fn test_config() -> MoovConfig {
    let mut config = MoovConfig::default();
    config.nick = "me".to_string();
    // Ticks are driven by hand
    config.sync.poll_interval_ms = 3_600_000;
    config.sync.persist_interval_secs = 0;
    config
}

pub struct Harness {
    pub handle: EngineHandle,
    pub sink: Arc<RecordingSink>,
    pub launcher: Arc<MockLauncher>,
    pub resolver: Arc<MockResolver>,
    pub repository: Arc<FlakyRepository>,
}

impl Harness {
    pub async fn start() -> Self {
        Self::with_sessions(Vec::new()).await
    }

    pub async fn with_sessions(sessions: Vec<Session>) -> Self {
        Self::build(sessions, RecordingSink::echoing()).await
    }

    /// A host that never feeds sent lines back, like the terminal.
    pub async fn without_echo() -> Self {
        Self::build(Vec::new(), RecordingSink::default()).await
    }

    async fn build(sessions: Vec<Session>, sink: RecordingSink) -> Self {
        let repository = Arc::new(FlakyRepository::with_sessions(sessions));
        let store = SessionStore::load(repository.clone()).await.unwrap();
        let sink = Arc::new(sink);
        let launcher = Arc::new(MockLauncher::default());
        let resolver = Arc::new(MockResolver::default());
        resolver.knows(cats());
        resolver.knows(dogs());

        let (handle, _task) = SyncEngine::spawn(
            test_config(),
            store,
            Collaborators {
                sink: sink.clone(),
                resolver: resolver.clone(),
                launcher: launcher.clone(),
            },
        );
        Self {
            handle,
            sink,
            launcher,
            resolver,
            repository,
        }
    }

    /// The local user types `text`; waits until it is fully handled.
    pub async fn say(&self, text: &str) {
        self.handle
            .handle_message(InboundMessage::local("me", text))
            .unwrap();
        self.handle.wait_idle().await.unwrap();
    }

    /// The peer sends `text`; waits until it is fully handled.
    pub async fn hear(&self, text: &str) {
        self.handle
            .handle_message(InboundMessage::remote("bob", text))
            .unwrap();
        self.handle.wait_idle().await.unwrap();
    }

    pub async fn poll(&self) {
        self.handle.poll_player().unwrap();
        self.handle.wait_idle().await.unwrap();
    }

    pub fn stored(&self) -> Vec<Session> {
        self.repository.snapshot()
    }
}

/// Polls `condition` until it holds or a second passes.
pub async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}
