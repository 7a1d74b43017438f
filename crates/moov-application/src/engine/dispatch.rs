//! Chat line classification and command handlers.

use super::{EngineEvent, ResolveIntent, SyncEngine};
use moov_core::command::format::{
    self, INVALID_ARGS, NO_SUCH_SESSION, NOTHING_PLAYING, RESOLUTION_FAILED,
};
use moov_core::command::{Command, ParsedLine, SeekKind, parse_line};
use moov_core::conversation::{InboundMessage, Origin};
use moov_core::player::CanonicalState;
use moov_core::session::VideoInfo;
use moov_core::{MoovError, Result};

impl SyncEngine {
    pub(super) async fn handle_message(&mut self, message: InboundMessage) {
        if message.origin == Origin::Local && self.ledger.consume(&message.text) {
            tracing::debug!(text = %message.text, "Dropping echo of our own message");
            return;
        }

        let color = match message.origin {
            Origin::Local => self.config.overlay.own_color,
            Origin::Remote => self.config.overlay.peer_color,
        };
        self.relay(&message.actor, &message.text, color).await;
        self.dispatch_line(&message.text).await;
    }

    /// Classifies `text` and runs the command it names, if any.
    pub(super) async fn dispatch_line(&mut self, text: &str) {
        match parse_line(text) {
            ParsedLine::Chat => {}
            ParsedLine::Invalid { keyword, reason } => {
                if keyword.requires_player() && self.player.is_none() {
                    return;
                }
                tracing::debug!(keyword = keyword.as_str(), reason = %reason, "Invalid command arguments");
                self.send_text(INVALID_ARGS).await;
            }
            ParsedLine::Command(command) => {
                if command.requires_player() && self.player.is_none() {
                    tracing::debug!(
                        keyword = command.keyword().as_str(),
                        "Ignoring player command with no player open"
                    );
                    return;
                }
                tracing::debug!(keyword = command.keyword().as_str(), "Dispatching command");
                if let Err(e) = self.execute(command).await {
                    self.report(e).await;
                }
            }
        }
    }

    async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Status => self.status().await,
            Command::TogglePause => {
                self.live()?.toggle_paused().await?;
                self.reply_status_and_persist().await
            }
            Command::Seek { kind, seconds } => {
                let player = self.live()?;
                let seconds = seconds as f64;
                match kind {
                    SeekKind::Absolute => player.seek(seconds.max(0.0)).await?,
                    SeekKind::Forward => player.relative_seek(seconds).await?,
                    SeekKind::Backward => player.relative_seek(-seconds).await?,
                }
                self.reply_status_and_persist().await
            }
            Command::Set(state) => self.set(state).await,
            Command::Close => {
                self.persist_live_time().await;
                self.teardown_player().await;
                Ok(())
            }
            Command::Add { url, time } => {
                self.resolve(url, ResolveIntent::Add { time: time as f64 });
                Ok(())
            }
            Command::Open { url, time } => {
                let request_id = self.resolve(url, ResolveIntent::Open { time: time as f64 });
                self.pending_open = Some(request_id);
                Ok(())
            }
            Command::List => {
                let list = format::session_list(self.store.list());
                self.send(list).await;
                Ok(())
            }
            Command::Pop(indices) => {
                self.store.pop(&indices).await?;
                let list = format::session_list(self.store.list());
                self.send(list).await;
                Ok(())
            }
            Command::Resume(index) => self.resume(index).await,
            Command::Reopen => {
                let status = self.live()?.status().await?;
                let Some(url) = self.player.as_ref().map(|p| p.url.clone()) else {
                    return Ok(());
                };
                self.send_text(format::open_command(&url, status.time)).await;
                Ok(())
            }
        }
    }

    /// Turns a failed command into its chat reply, or just a log line.
    async fn report(&mut self, error: MoovError) {
        match error {
            MoovError::PlayerUnavailable => {}
            MoovError::Parse(reason) => {
                tracing::debug!(reason = %reason, "Rejected command");
                self.send_text(INVALID_ARGS).await;
            }
            MoovError::EmptyStore | MoovError::IndexOutOfRange { .. } => {
                self.send_text(NO_SUCH_SESSION).await;
            }
            MoovError::Resolution { url, message } => {
                tracing::warn!(url = %url, message = %message, "Could not resolve video");
                self.send_text(RESOLUTION_FAILED).await;
            }
            e @ (MoovError::Io { .. } | MoovError::Serialization { .. }) => {
                tracing::error!("Session store write failed: {}", e);
            }
            e => tracing::warn!("Command failed: {}", e),
        }
    }

    async fn status(&mut self) -> Result<()> {
        let alive = match &self.player {
            Some(player) => player.controller.alive().await,
            None => false,
        };
        if !alive {
            self.send_text(NOTHING_PLAYING).await;
            return Ok(());
        }
        match self.live()?.status().await {
            Ok(status) => {
                self.note_time(status.time);
                self.send_text(format::status_line(&status)).await;
            }
            Err(e) => {
                tracing::warn!("Status query failed: {}", e);
                self.send_text(NOTHING_PLAYING).await;
            }
        }
        Ok(())
    }

    async fn set(&mut self, state: CanonicalState) -> Result<()> {
        let player = self.live()?;
        let count = match player.status().await {
            Ok(status) => status.playlist_count,
            Err(_) => 0,
        };
        if state.position >= count {
            return Err(MoovError::parse(format!(
                "playlist position {} beyond {count} entries",
                state.position + 1
            )));
        }
        player.set_canonical(state).await?;
        self.reply_status_and_persist().await
    }

    async fn resume(&mut self, index: Option<usize>) -> Result<()> {
        // Supersedes any `.o` still being looked up
        self.pending_open = None;

        let index = match index {
            Some(index) => index,
            None => self.store.len().checked_sub(1).ok_or(MoovError::EmptyStore)?,
        };
        let session = self.store.set_top(index).await?;

        if !self.start_playback(session.url(), session.time).await {
            return Ok(());
        }
        self.send_text(format::open_command(session.url(), session.time))
            .await;
        self.reply_status().await;
        Ok(())
    }

    /// Starts a lookup task and returns its request id.
    fn resolve(&mut self, url: String, intent: ResolveIntent) -> u64 {
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.in_flight += 1;

        let resolver = self.collaborators.resolver.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = resolver.resolve(&url).await;
            let _ = tx.send(EngineEvent::Resolved {
                request_id,
                url,
                intent,
                result,
            });
        });
        request_id
    }

    pub(super) async fn on_resolved(
        &mut self,
        request_id: u64,
        url: String,
        intent: ResolveIntent,
        result: Result<VideoInfo>,
    ) {
        let outcome = match result {
            Ok(info) => self.finish_lookup(request_id, info, intent).await,
            Err(e) => {
                if matches!(intent, ResolveIntent::Open { .. }) {
                    if self.pending_open != Some(request_id) {
                        tracing::debug!(url = %url, request_id, "Ignoring failed lookup for superseded open");
                        return;
                    }
                    self.pending_open = None;
                }
                Err(e)
            }
        };
        if let Err(e) = outcome {
            self.report(e).await;
        }
    }

    async fn finish_lookup(
        &mut self,
        request_id: u64,
        info: VideoInfo,
        intent: ResolveIntent,
    ) -> Result<()> {
        match intent {
            ResolveIntent::Add { time } => {
                let added = self.store.add(info, time).await?;
                let prefix = if added.duplicate { "already have " } else { "added " };
                self.send(format::session_reply(prefix, added.index, &added.session))
                    .await;
                Ok(())
            }
            ResolveIntent::Open { time } => {
                let current = self.pending_open == Some(request_id);
                if current {
                    self.pending_open = None;
                }
                let added = self.store.add(info, time).await?;
                if !current {
                    tracing::debug!(
                        url = added.session.url(),
                        request_id,
                        "Discarding superseded open"
                    );
                    return Ok(());
                }

                let session = self.store.set_top(added.index).await?;
                if !self.start_playback(session.url(), time).await {
                    return Ok(());
                }
                self.reply_status().await;
                Ok(())
            }
        }
    }
}
