//! Rotation actor: an isolated Tokio task that owns one session at a time.
//!
//! The actor `select!`s over its command channel and a [`TickScheduler`]
//! that is paused whenever no session is active, so an idle controller
//! costs nothing but a parked task.

use std::time::Duration;

use rollcall_geo::{LocationCache, LocationSource, RefreshTask};
use rollcall_tick::{TickConfig, TickScheduler};
use rollcall_token::{Clock, SessionDescriptor, Token, TokenCodec};
use tokio::sync::{mpsc, oneshot};

use crate::{RotationConfig, RotationError, RotationSnapshot, RotationState};

/// Commands sent to a rotation actor through its channel.
enum RotationCommand {
    Start {
        descriptor: SessionDescriptor,
        reply: oneshot::Sender<Result<Token, RotationError>>,
    },
    End {
        reply: oneshot::Sender<bool>,
    },
    CurrentToken {
        reply: oneshot::Sender<Option<Token>>,
    },
    Snapshot {
        reply: oneshot::Sender<RotationSnapshot>,
    },
    Shutdown,
}

/// Handle to a running rotation actor.
///
/// Cheap to clone. When the last handle is dropped the actor ends any
/// active session and exits.
#[derive(Clone)]
pub struct RotationHandle {
    sender: mpsc::Sender<RotationCommand>,
}

impl RotationHandle {
    /// Starts a session and returns its first token (sequence 1).
    ///
    /// # Errors
    /// - [`RotationError::AlreadyActive`] if a session is running.
    /// - [`RotationError::Encoding`] if the first token can't be minted;
    ///   the controller stays inactive.
    pub async fn start_session(
        &self,
        descriptor: SessionDescriptor,
    ) -> Result<Token, RotationError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RotationCommand::Start {
            descriptor,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| RotationError::Unavailable)?
    }

    /// Ends the active session, if any. Returns whether one was running.
    pub async fn end_session(&self) -> Result<bool, RotationError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RotationCommand::End { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| RotationError::Unavailable)
    }

    /// The token the screen should show right now; `None` while inactive.
    pub async fn current_token(&self) -> Result<Option<Token>, RotationError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RotationCommand::CurrentToken { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| RotationError::Unavailable)
    }

    pub async fn snapshot(&self) -> Result<RotationSnapshot, RotationError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RotationCommand::Snapshot { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| RotationError::Unavailable)
    }

    /// Ends any active session and stops the actor.
    pub async fn shutdown(&self) -> Result<(), RotationError> {
        self.send(RotationCommand::Shutdown).await
    }

    /// `true` once the actor has exited.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, cmd: RotationCommand) -> Result<(), RotationError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RotationError::Unavailable)
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct RotationActor<S: LocationSource, C: TokenCodec, K: Clock> {
    config: RotationConfig,
    state: RotationState,
    scheduler: TickScheduler,
    cache: LocationCache<S>,
    refresh: Option<RefreshTask>,
    codec: C,
    clock: K,
    receiver: mpsc::Receiver<RotationCommand>,
}

impl<S: LocationSource, C: TokenCodec, K: Clock> RotationActor<S, C, K> {
    async fn run(mut self) {
        tracing::info!(
            interval_ms = self.config.interval_ms,
            ceiling = self.config.sequence_ceiling,
            "rotation controller started"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle(cmd).await {
                        break;
                    }
                }
                info = self.scheduler.wait_for_tick() => {
                    tracing::trace!(tick = info.tick, overrun = info.overrun, "rotation tick");
                    self.rotate().await;
                }
            }
        }

        self.end();
        tracing::info!("rotation controller stopped");
    }

    /// Returns `false` when the actor should exit.
    async fn handle(&mut self, cmd: RotationCommand) -> bool {
        match cmd {
            RotationCommand::Start { descriptor, reply } => {
                let result = self.start(descriptor).await;
                let _ = reply.send(result);
            }
            RotationCommand::End { reply } => {
                let _ = reply.send(self.end());
            }
            RotationCommand::CurrentToken { reply } => {
                let _ = reply.send(self.state.current_token().cloned());
            }
            RotationCommand::Snapshot { reply } => {
                let now = self.clock.now_epoch_seconds();
                let _ = reply.send(self.state.snapshot(now));
            }
            RotationCommand::Shutdown => {
                tracing::info!("rotation controller shutting down");
                return false;
            }
        }
        true
    }

    async fn start(&mut self, descriptor: SessionDescriptor) -> Result<Token, RotationError> {
        if self.state.is_active() {
            return Err(RotationError::AlreadyActive);
        }

        // Errors are logged by the cache; fall back to what it already holds.
        let location = match self.cache.refresh_within(self.config.refresh.timeout()).await {
            Ok(sample) => sample,
            Err(_) => self.cache.get().await,
        };
        let now = self.clock.now_epoch_seconds();
        let token = self.codec.encode(&descriptor, 1, &location, now)?;

        tracing::info!(session = %descriptor, %location, "session started");
        self.state.begin(descriptor, token.clone(), now);
        self.scheduler.resume();
        self.refresh = Some(self.cache.spawn_refresh(self.config.refresh.clone()));

        Ok(token)
    }

    fn end(&mut self) -> bool {
        self.scheduler.pause();
        if let Some(refresh) = self.refresh.take() {
            refresh.stop();
        }
        let ended = self.state.end();
        if ended {
            tracing::info!("session ended");
        }
        ended
    }

    async fn rotate(&mut self) {
        if !self.state.is_active() {
            return;
        }

        let sequence = self.state.advance();
        let location = self.cache.get().await;
        let now = self.clock.now_epoch_seconds();

        let Some(descriptor) = self.state.descriptor() else {
            return;
        };
        match self.codec.encode(descriptor, sequence, &location, now) {
            Ok(token) => {
                tracing::debug!(sequence, "token rotated");
                self.state.record(token, now);
            }
            Err(e) => {
                // Keep showing the previous token; the next tick tries again.
                tracing::warn!(sequence, error = %e, "token rotation failed");
            }
        }
    }
}

/// Spawns a rotation controller and returns a handle to it.
///
/// The controller samples the instructor's position from `source` through
/// a [`LocationCache`] seeded with `config.fallback_location`. Starting a
/// session takes a fresh fix, waiting at most `config.refresh.timeout_ms`,
/// and uses the cached or fallback sample only when that fails.
pub fn spawn_controller<S, C, K>(
    config: RotationConfig,
    source: S,
    codec: C,
    clock: K,
) -> RotationHandle
where
    S: LocationSource,
    C: TokenCodec,
    K: Clock,
{
    let config = config.validated();
    let (tx, rx) = mpsc::channel(config.command_buffer);

    let scheduler = TickScheduler::new(TickConfig {
        start_paused: true,
        ..TickConfig::every(Duration::from_millis(config.interval_ms))
    });

    let actor = RotationActor {
        state: RotationState::new(config.sequence_ceiling),
        scheduler,
        cache: LocationCache::new(source, config.fallback_location),
        refresh: None,
        codec,
        clock,
        receiver: rx,
        config,
    };

    tokio::spawn(actor.run());

    RotationHandle { sender: tx }
}
