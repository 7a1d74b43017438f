//! The sync engine actor.
//!
//! One task owns the session store, the open player and the echo ledger.
//! Everything else (the chat host, the per-player ticker, metadata lookups)
//! talks to it by sending [`EngineEvent`]s, so state is only ever touched
//! from one place.

mod dispatch;
mod playback;

use crate::echo_ledger::EchoLedger;
use moov_core::config::MoovConfig;
use moov_core::conversation::{ConversationSink, InboundMessage, OutgoingMessage};
use moov_core::player::{PlayerController, PlayerLauncher, Rgb};
use moov_core::resolver::MetadataResolver;
use moov_core::session::{SessionStore, VideoInfo};
use moov_core::{MoovError, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// What a finished lookup was for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolveIntent {
    Add { time: f64 },
    Open { time: f64 },
}

pub enum EngineEvent {
    Message(InboundMessage),
    Resolved {
        request_id: u64,
        url: String,
        intent: ResolveIntent,
        result: Result<VideoInfo>,
    },
    /// Sync loop tick for the player of the given generation.
    Tick { generation: u64 },
    /// Tick for whatever player is open now.
    PollPlayer,
    /// Answered once no lookups are in flight and earlier events are handled.
    WaitIdle(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// The collaborators the engine drives.
#[derive(Clone)]
pub struct Collaborators {
    pub sink: Arc<dyn ConversationSink>,
    pub resolver: Arc<dyn MetadataResolver>,
    pub launcher: Arc<dyn PlayerLauncher>,
}

/// Cheap, cloneable way into the engine.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineHandle {
    /// Queues one chat line for classification.
    pub fn handle_message(&self, message: InboundMessage) -> Result<()> {
        self.send(EngineEvent::Message(message))
    }

    /// Runs one sync loop step now instead of waiting for the ticker.
    pub fn poll_player(&self) -> Result<()> {
        self.send(EngineEvent::PollPlayer)
    }

    /// Resolves once every queued event and lookup has been handled.
    pub async fn wait_idle(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineEvent::WaitIdle(tx))?;
        rx.await.map_err(|_| stopped())
    }

    /// Persists the live time, closes the player and stops the engine.
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineEvent::Shutdown(tx))?;
        rx.await.map_err(|_| stopped())
    }

    fn send(&self, event: EngineEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| stopped())
    }
}

fn stopped() -> MoovError {
    MoovError::internal("sync engine has stopped")
}

/// The player currently open, with its sync loop bookkeeping.
struct LivePlayer {
    controller: Arc<dyn PlayerController>,
    generation: u64,
    ticker: CancellationToken,
    /// URL of the session being watched
    url: String,
    last_time: f64,
    last_persist: Instant,
}

pub struct SyncEngine {
    config: MoovConfig,
    store: SessionStore,
    collaborators: Collaborators,
    player: Option<LivePlayer>,
    generation: u64,
    ledger: EchoLedger,
    next_request_id: u64,
    /// The `.o` lookup whose result should open the player
    pending_open: Option<u64>,
    in_flight: usize,
    idle_waiters: Vec<oneshot::Sender<()>>,
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl SyncEngine {
    /// Starts the engine task.
    pub fn spawn(
        config: MoovConfig,
        store: SessionStore,
        collaborators: Collaborators,
    ) -> (EngineHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Self {
            config,
            store,
            collaborators,
            player: None,
            generation: 0,
            ledger: EchoLedger::default(),
            next_request_id: 0,
            pending_open: None,
            in_flight: 0,
            idle_waiters: Vec::new(),
            tx: tx.clone(),
        };
        let task = tokio::spawn(engine.run(rx));
        (EngineHandle { tx }, task)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<EngineEvent>) {
        tracing::info!("[SyncEngine] started");
        while let Some(event) = rx.recv().await {
            match event {
                EngineEvent::Message(message) => self.handle_message(message).await,
                EngineEvent::Resolved {
                    request_id,
                    url,
                    intent,
                    result,
                } => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    self.on_resolved(request_id, url, intent, result).await;
                }
                EngineEvent::Tick { generation } => self.tick(Some(generation)).await,
                EngineEvent::PollPlayer => self.tick(None).await,
                EngineEvent::WaitIdle(waiter) => self.idle_waiters.push(waiter),
                EngineEvent::Shutdown(done) => {
                    self.shutdown().await;
                    let _ = done.send(());
                    break;
                }
            }
            if self.in_flight == 0 {
                for waiter in self.idle_waiters.drain(..) {
                    let _ = waiter.send(());
                }
            }
        }
        tracing::info!("[SyncEngine] stopped");
    }

    async fn shutdown(&mut self) {
        self.persist_live_time().await;
        self.teardown_player().await;
    }

    /// Sends `message` to the peer and shows it on the overlay. When the
    /// host echoes sent lines back, it is remembered so the echo is dropped.
    async fn send(&mut self, message: OutgoingMessage) {
        if self.collaborators.sink.echoes_sent() {
            self.ledger.record(message.text.clone());
        }
        let nick = self.config.nick.clone();
        self.relay(&nick, &message.text, self.config.overlay.own_color)
            .await;
        self.collaborators.sink.send(message).await;
    }

    async fn send_text(&mut self, text: impl Into<String>) {
        self.send(OutgoingMessage::plain(text)).await;
    }

    async fn relay(&self, actor: &str, text: &str, color: Rgb) {
        if let Some(player) = &self.player {
            player
                .controller
                .put_message(
                    &format!("{actor}: {text}"),
                    color,
                    self.config.overlay.background,
                )
                .await;
        }
    }
}
