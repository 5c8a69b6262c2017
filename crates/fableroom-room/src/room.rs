//! Room actor: one Tokio task per room, owning its [`RoomState`].
//!
//! Connections, the deadline timer and the narration task all talk to the
//! room through one bounded command channel. The actor handles a command
//! completely (transition, save, broadcast, timer and generator calls)
//! before it reads the next one, so no reader ever sees a half-applied
//! event.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use fableroom_narrator::{NarrationError, Narrator, PromptTurn};
use fableroom_protocol::{
    ClientEvent, Codec, JsonCodec, ParticipantId, RoomCode, RoomSnapshot, ServerMessage,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::timer::DeadlineTimer;
use crate::transition::{transition, Effect, RoomEvent, TransitionContext};
use crate::{RoomConfig, RoomError, RoomState, RoomStore};

/// Channel a room pushes snapshots into for one participant.
pub type ParticipantSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        participant: ParticipantId,
        sender: ParticipantSender,
        reply: oneshot::Sender<()>,
    },
    Leave {
        participant: ParticipantId,
    },
    Client {
        participant: ParticipantId,
        event: ClientEvent,
    },
    DeadlineFired {
        round: u64,
    },
    NarrationFinished {
        round: u64,
        outcome: Result<String, NarrationError>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Shutdown,
}

/// Handle to a running room actor.
///
/// Cheap to clone. The room keeps running while any handle exists.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Whether the actor behind this handle has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Registers a participant and their snapshot channel.
    ///
    /// Returns once the room has counted the participant; the first
    /// snapshot is already queued on `sender` by then.
    pub async fn join(
        &self,
        participant: ParticipantId,
        sender: ParticipantSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            participant,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Deregisters a participant (fire-and-forget).
    pub async fn leave(&self, participant: ParticipantId) -> Result<(), RoomError> {
        self.send(RoomCommand::Leave { participant }).await
    }

    /// Delivers a typed client message.
    pub async fn client_event(
        &self,
        participant: ParticipantId,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Client { participant, event }).await
    }

    /// Decodes a raw client frame and delivers it.
    ///
    /// Frames that do not decode are dropped; only a stopped room is an
    /// error.
    pub async fn client_payload(
        &self,
        participant: ParticipantId,
        payload: &[u8],
    ) -> Result<(), RoomError> {
        match JsonCodec.decode::<ClientEvent>(payload) {
            Ok(event) => self.client_event(participant, event).await,
            Err(err) => {
                tracing::debug!(
                    room = %self.code,
                    %participant,
                    error = %err,
                    "dropping undecodable client message"
                );
                Ok(())
            }
        }
    }

    /// Injects a deadline firing for `round`, as the room's own timer does.
    pub async fn deadline_fired(&self, round: u64) -> Result<(), RoomError> {
        self.send(RoomCommand::DeadlineFired { round }).await
    }

    /// The room as its participants currently see it.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Stops the actor. Pending wake-ups and narration are abandoned.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }
}

struct RoomActor<N: Narrator, S: RoomStore> {
    code: RoomCode,
    state: RoomState,
    config: Arc<RoomConfig>,
    narrator: Arc<N>,
    store: Arc<S>,
    senders: HashMap<ParticipantId, ParticipantSender>,
    timer: DeadlineTimer<RoomCommand>,
    narration: Option<JoinHandle<()>>,
    rng: StdRng,
    /// Weak so that the room stops once every handle is gone.
    commands: mpsc::WeakSender<RoomCommand>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<N: Narrator, S: RoomStore> RoomActor<N, S> {
    async fn run(mut self) {
        tracing::info!(room = %self.code, phase = %self.state.phase(), "room actor started");
        self.apply(RoomEvent::Resumed).await;

        while let Some(command) = self.receiver.recv().await {
            match command {
                RoomCommand::Join {
                    participant,
                    sender,
                    reply,
                } => {
                    self.senders.insert(participant, sender);
                    self.apply(RoomEvent::ParticipantJoined(participant)).await;
                    tracing::info!(
                        room = %self.code,
                        %participant,
                        connected = self.state.connected(),
                        "participant joined"
                    );
                    let _ = reply.send(());
                }
                RoomCommand::Leave { participant } => {
                    self.senders.remove(&participant);
                    self.apply(RoomEvent::ParticipantLeft(participant)).await;
                    tracing::info!(
                        room = %self.code,
                        %participant,
                        connected = self.state.connected(),
                        "participant left"
                    );
                }
                RoomCommand::Client { participant, event } => {
                    self.apply(RoomEvent::Client { participant, event }).await;
                }
                RoomCommand::DeadlineFired { round } => {
                    self.apply(RoomEvent::DeadlineFired { round }).await;
                }
                RoomCommand::NarrationFinished { round, outcome } => {
                    self.apply(RoomEvent::NarrationFinished { round, outcome })
                        .await;
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.state.snapshot());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room = %self.code, "room shutting down");
                    break;
                }
            }
        }

        self.timer.cancel();
        if let Some(narration) = self.narration.take() {
            narration.abort();
        }
        tracing::info!(room = %self.code, "room actor stopped");
    }

    async fn apply(&mut self, event: RoomEvent) {
        let mut ctx = TransitionContext {
            config: &self.config,
            now: Utc::now(),
            rng: &mut self.rng,
        };
        let effects = transition(&mut self.state, event, &mut ctx);

        for effect in effects {
            match effect {
                Effect::Persist => self.persist().await,
                Effect::ArmDeadline { at, round } => self.timer.arm(at, round),
                Effect::CancelDeadline => self.timer.cancel(),
                Effect::RequestNarration { round, prompt } => {
                    self.request_narration(round, prompt)
                }
            }
        }
    }

    async fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.code, &self.state).await {
            tracing::warn!(room = %self.code, error = %err, "failed to persist room");
        }
        self.broadcast();
    }

    /// Pushes the current snapshot to every participant, forgetting those
    /// whose connection is gone.
    fn broadcast(&mut self) {
        let message = ServerMessage::State {
            state: self.state.snapshot(),
        };
        let code = &self.code;
        self.senders.retain(|participant, sender| {
            let delivered = sender.send(message.clone()).is_ok();
            if !delivered {
                tracing::debug!(room = %code, %participant, "dropping closed participant channel");
            }
            delivered
        });
    }

    /// Runs the generator off the actor loop.
    ///
    /// The call itself runs in its own task so that a panic or the
    /// narration timeout still produces a `NarrationFinished` for `round`
    /// and the advance lock is always released.
    fn request_narration(&mut self, round: u64, prompt: Vec<PromptTurn>) {
        if let Some(previous) = self.narration.take() {
            previous.abort();
        }

        let narrator = Arc::clone(&self.narrator);
        let commands = self.commands.clone();
        let timeout = self.config.narration_timeout;
        let code = self.code.clone();

        self.narration = Some(tokio::spawn(async move {
            let mut call = tokio::spawn(async move { narrator.narrate(&prompt).await });

            let outcome = match tokio::time::timeout(timeout, &mut call).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => Err(NarrationError::Aborted(join_err.to_string())),
                Err(_) => {
                    call.abort();
                    Err(NarrationError::Timeout(timeout))
                }
            };

            match commands.upgrade() {
                Some(sender) => {
                    let _ = sender
                        .send(RoomCommand::NarrationFinished { round, outcome })
                        .await;
                }
                None => {
                    tracing::debug!(room = %code, round, "room stopped before narration finished");
                }
            }
        }));
    }
}

/// Spawns a room actor over `state` and returns its handle.
///
/// A room loaded mid-round picks up where it left off: an unfinished
/// narration is requested again and voting reopens with a fresh window.
pub(crate) fn spawn_room<N: Narrator, S: RoomStore>(
    code: RoomCode,
    state: RoomState,
    config: Arc<RoomConfig>,
    narrator: Arc<N>,
    store: Arc<S>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let commands = tx.downgrade();

    let actor = RoomActor {
        code: code.clone(),
        state,
        timer: DeadlineTimer::new(commands.clone(), |round| RoomCommand::DeadlineFired { round }),
        config,
        narrator,
        store,
        senders: HashMap::new(),
        narration: None,
        rng: StdRng::from_os_rng(),
        commands,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
