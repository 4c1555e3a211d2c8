//! The single consumer that owns a session's player handle.
//!
//! All events of a session go through one queue, so restarts never overlap
//! and an explicit stop can cancel a pending restart.

use std::sync::Arc;

use serenity::all::GuildId;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{self, Instant},
};

use super::{
    backend::{EventSink, PlayerEvent, PlayerHandle, SessionMessage, VoiceBackend},
    session::{Lifecycle, RestartPolicy, SessionState, Step},
    SessionObserver,
};
use crate::error::PlaybackError;

/// Registry entry for a running session.
pub(crate) struct Session {
    pub(crate) url: String,
    pub(crate) status: watch::Receiver<SessionState>,
    tx: mpsc::UnboundedSender<SessionMessage>,
    task: JoinHandle<()>,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn spawn<B: VoiceBackend>(
        guild: GuildId,
        url: String,
        backend: Arc<B>,
        policy: RestartPolicy,
        observer: Option<Arc<dyn SessionObserver>>,
        player: Box<dyn PlayerHandle>,
        tx: mpsc::UnboundedSender<SessionMessage>,
        rx: mpsc::UnboundedReceiver<SessionMessage>,
    ) -> Self {
        let (status_tx, status) = watch::channel(SessionState::Starting);
        let actor = SessionActor {
            guild,
            url: url.clone(),
            backend,
            lifecycle: Lifecycle::new(policy),
            observer,
            player: Some(player),
            generation: 0,
            pending_restart: None,
            tx: tx.downgrade(),
            rx,
            status: status_tx,
        };
        let task = tokio::spawn(actor.run());

        Self {
            url,
            status,
            tx,
            task,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.status.borrow()
    }

    /// Whether the session ended on its own (failure or lost connection).
    pub(crate) fn is_over(&self) -> bool {
        self.state().is_terminal()
    }

    /// Stops the player and waits for the actor to finish.
    pub(crate) async fn shutdown(self) {
        let (done, finished) = oneshot::channel();
        if self.tx.send(SessionMessage::Shutdown(done)).is_ok() {
            finished.await.ok();
        }
        if let Err(e) = self.task.await {
            log::error!("Session task for {} ended abnormally: {e}", self.url);
        }
    }
}

struct SessionActor<B> {
    guild: GuildId,
    url: String,
    backend: Arc<B>,
    lifecycle: Lifecycle,
    observer: Option<Arc<dyn SessionObserver>>,
    player: Option<Box<dyn PlayerHandle>>,
    generation: u64,
    pending_restart: Option<Instant>,
    tx: mpsc::WeakUnboundedSender<SessionMessage>,
    rx: mpsc::UnboundedReceiver<SessionMessage>,
    status: watch::Sender<SessionState>,
}

impl<B: VoiceBackend> SessionActor<B> {
    async fn run(mut self) {
        loop {
            let message = match self.pending_restart {
                Some(deadline) => tokio::select! {
                    biased;
                    message = self.rx.recv() => message,
                    _ = time::sleep_until(deadline) => {
                        self.pending_restart = None;
                        let step = self.restart().await;
                        if !self.apply(step).await {
                            break;
                        }
                        continue;
                    }
                },
                None => self.rx.recv().await,
            };

            let Some(message) = message else {
                break;
            };

            match message {
                SessionMessage::Shutdown(done) => {
                    self.stop_player();
                    self.lifecycle.stop();
                    self.publish();
                    done.send(()).ok();
                    break;
                }
                SessionMessage::Player { generation, event } => {
                    if generation != self.generation {
                        log::debug!(
                            "Ignoring {event:?} from superseded player {generation} in guild {}",
                            self.guild
                        );
                        continue;
                    }
                    if self.pending_restart.is_some() {
                        if event != PlayerEvent::Disconnected {
                            log::debug!("Restart already pending, ignoring {event:?}");
                            continue;
                        }
                        self.pending_restart = None;
                    }
                    if let PlayerEvent::Errored(message) = &event {
                        log::error!("Audio error in guild {}: {message}", self.guild);
                    }

                    let previous = self.lifecycle.state();
                    let step = self.lifecycle.on_event(&event);
                    log::debug!(
                        "Audio player in guild {} transitioned from {previous} to {}",
                        self.guild,
                        self.lifecycle.state()
                    );
                    if !self.apply(step).await {
                        break;
                    }
                }
            }
        }
        log::debug!("Session actor for guild {} finished", self.guild);
    }

    /// Carries out a step. Returns `false` once the session is over.
    async fn apply(&mut self, step: Step) -> bool {
        let keep_going = match step {
            Step::Nothing => true,
            Step::Restart(delay) => {
                log::info!(
                    "Restarting audio stream {} in guild {} in {delay:?}",
                    self.url,
                    self.guild
                );
                self.pending_restart = Some(Instant::now() + delay);
                true
            }
            Step::Fail { attempts } => {
                self.fail(attempts).await;
                false
            }
            Step::Stop => {
                log::info!("Voice connection in guild {} went away", self.guild);
                self.stop_player();
                if let Err(e) = self.backend.leave(self.guild).await {
                    log::error!("Could not drop dead call in guild {}: {e}", self.guild);
                }
                false
            }
        };
        self.publish();
        keep_going
    }

    async fn restart(&mut self) -> Step {
        self.stop_player();
        self.generation += 1;

        let Some(tx) = self.tx.upgrade() else {
            return Step::Stop;
        };
        let sink = EventSink::new(self.generation, tx);
        match self.backend.play(self.guild, &self.url, sink).await {
            Ok(player) => {
                self.player = Some(player);
                Step::Nothing
            }
            Err(e) => {
                log::error!("Restart of {} in guild {} failed: {e}", self.url, self.guild);
                self.lifecycle.on_event(&PlayerEvent::Errored(e.to_string()))
            }
        }
    }

    async fn fail(&mut self, attempts: u32) {
        let error = PlaybackError::RestartsExhausted { attempts };
        log::error!("Giving up on {} in guild {}: {error}", self.url, self.guild);
        self.stop_player();

        if let Err(e) = self.backend.leave(self.guild).await {
            log::error!("Could not leave guild {} after failure: {e}", self.guild);
        }
        if let Some(observer) = &self.observer {
            observer.session_failed(self.guild, &self.url, &error).await;
        }
    }

    fn stop_player(&mut self) {
        if let Some(player) = self.player.take() {
            player.stop();
        }
    }

    fn publish(&self) {
        self.status.send_replace(self.lifecycle.state());
    }
}
