//! Player lifecycle and the synchronization loop.

use super::{EngineEvent, LivePlayer, SyncEngine};
use moov_core::command::format::{self, PLAYER_START_FAILED};
use moov_core::player::PlayerController;
use moov_core::{MoovError, Result};
use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

impl SyncEngine {
    /// The open player, or `PlayerUnavailable`.
    pub(super) fn live(&self) -> Result<Arc<dyn PlayerController>> {
        self.player
            .as_ref()
            .map(|p| p.controller.clone())
            .ok_or(MoovError::PlayerUnavailable)
    }

    pub(super) fn note_time(&mut self, time: f64) {
        if let Some(player) = self.player.as_mut() {
            player.last_time = time;
        }
    }

    /// Replaces any open player with a fresh one showing `url` at `time`.
    ///
    /// Replies with the start failure and returns false if it cannot.
    pub(super) async fn start_playback(&mut self, url: &str, time: f64) -> bool {
        self.persist_live_time().await;
        self.teardown_player().await;

        let controller = match self.collaborators.launcher.launch().await {
            Ok(controller) => controller,
            Err(e) => {
                tracing::warn!("Could not start player: {}", e);
                self.send_text(PLAYER_START_FAILED).await;
                return false;
            }
        };
        let opened = async {
            controller.open(url).await?;
            controller.seek(time).await
        }
        .await;
        if let Err(e) = opened {
            tracing::warn!(url, "Could not open video: {}", e);
            let _ = controller.close().await;
            self.send_text(PLAYER_START_FAILED).await;
            return false;
        }

        self.generation += 1;
        let ticker = self.spawn_ticker(self.generation);
        self.player = Some(LivePlayer {
            controller,
            generation: self.generation,
            ticker,
            url: url.to_string(),
            last_time: time,
            last_persist: Instant::now(),
        });
        tracing::info!(url, generation = self.generation, "Player opened");
        true
    }

    /// Stops the ticker and closes the player, if there is one.
    pub(super) async fn teardown_player(&mut self) {
        let Some(player) = self.player.take() else {
            return;
        };
        player.ticker.cancel();
        if let Err(e) = player.controller.close().await {
            tracing::warn!("Closing player failed: {}", e);
        }
        tracing::info!(url = %player.url, generation = player.generation, "Player closed");
    }

    /// Stores the live time for the open session (the last known one if
    /// the player no longer answers).
    pub(super) async fn persist_live_time(&mut self) {
        let Some(player) = self.player.as_ref() else {
            return;
        };
        let controller = player.controller.clone();
        if controller.alive().await {
            if let Ok(status) = controller.status().await {
                self.note_time(status.time);
            }
        }
        self.save_last_time().await;
    }

    async fn save_last_time(&mut self) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        player.last_persist = Instant::now();
        let url = player.url.clone();
        let time = player.last_time;
        if let Err(e) = self.store.update_time(&url, time).await {
            tracing::error!(url = %url, "Persisting playback time failed: {}", e);
        }
    }

    /// Replies with the player's status line.
    pub(super) async fn reply_status(&mut self) {
        let Ok(controller) = self.live() else {
            return;
        };
        match controller.status().await {
            Ok(status) => {
                self.note_time(status.time);
                self.send_text(format::status_line(&status)).await;
            }
            Err(e) => tracing::warn!("Status query failed: {}", e),
        }
    }

    pub(super) async fn reply_status_and_persist(&mut self) -> Result<()> {
        self.reply_status().await;
        self.save_last_time().await;
        Ok(())
    }

    fn spawn_ticker(&self, generation: u64) -> CancellationToken {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let tx = self.tx.clone();
        let period = self.config.sync.poll_interval();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(EngineEvent::Tick { generation }).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        token
    }

    /// One synchronization loop step. `generation` pins the tick to the
    /// player that scheduled it; `None` means whichever player is open.
    pub(super) async fn tick(&mut self, generation: Option<u64>) {
        let Some(player) = self.player.as_ref() else {
            return;
        };
        if generation.is_some_and(|g| g != player.generation) {
            return;
        }
        let controller = player.controller.clone();

        if !controller.alive().await {
            tracing::info!("Player exited");
            self.save_last_time().await;
            self.teardown_player().await;
            return;
        }

        let persist_due = self
            .player
            .as_ref()
            .is_some_and(|p| p.last_persist.elapsed() >= self.config.sync.persist_interval());
        if persist_due {
            if let Ok(status) = controller.status().await {
                self.note_time(status.time);
            }
            self.save_last_time().await;
        }

        for text in controller.drain_user_inputs().await {
            self.send_text(text.clone()).await;
            self.dispatch_line(&text).await;
        }

        for state in controller.drain_user_control_changes().await {
            self.note_time(state.time);
            self.send_text(format::set_command(&state)).await;
        }
    }
}
