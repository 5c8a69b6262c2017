//! The room state machine.
//!
//! [`transition`] is the only code that mutates a [`RoomState`]. It performs
//! no I/O: everything that has to happen outside the state (saving, timers,
//! calling the generator) is returned as an [`Effect`] for the room actor to
//! carry out, in order, before it takes the next event.
//!
//! ```text
//! LOBBY --StartGame--> NARRATING --(narration done)--> VOTING
//! VOTING --(deadline OR full turnout)--> NARRATING --...
//! NARRATING --(game over / health 0)--> GAME_OVER
//! NARRATING --(victory)--> VICTORY
//! ```

use chrono::{DateTime, Utc};
use fableroom_narrator::{NarrationError, PromptTurn};
use fableroom_protocol::{ClientEvent, OptionId, ParticipantId, Phase, Turn};
use rand::Rng;

use crate::directives::{self, Outcome};
use crate::prompt::{build_prompt, choice_turn, pending_action, OPENING_TURN};
use crate::resolve::resolve;
use crate::state::{Advance, RoomState};
use crate::RoomConfig;

/// Something that happened to a room.
#[derive(Debug)]
pub enum RoomEvent {
    ParticipantJoined(ParticipantId),
    ParticipantLeft(ParticipantId),
    Client {
        participant: ParticipantId,
        event: ClientEvent,
    },
    /// A voting window's wake-up, tagged with the round it was armed for.
    DeadlineFired { round: u64 },
    /// The generator answered (or gave up) for `round`.
    NarrationFinished {
        round: u64,
        outcome: Result<String, NarrationError>,
    },
    /// The room was loaded from the store and its actor just started.
    Resumed,
}

/// Work the room actor performs after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Save the state and push a snapshot to every participant.
    Persist,
    /// Replace any pending wake-up with one at `at` for `round`.
    ArmDeadline { at: DateTime<Utc>, round: u64 },
    /// Drop the pending wake-up, if any.
    CancelDeadline,
    /// Ask the generator for the narration of `round`.
    RequestNarration { round: u64, prompt: Vec<PromptTurn> },
}

/// Inputs a transition needs besides the state and the event.
pub struct TransitionContext<'a, R: Rng + ?Sized> {
    pub config: &'a RoomConfig,
    pub now: DateTime<Utc>,
    pub rng: &'a mut R,
}

/// Applies `event` to `state`.
///
/// Events that are not valid for the current phase, votes from participants
/// who already voted, and anything arriving while a round advance is in
/// flight leave the state untouched and return no effects.
pub fn transition<R: Rng + ?Sized>(
    state: &mut RoomState,
    event: RoomEvent,
    ctx: &mut TransitionContext<'_, R>,
) -> Vec<Effect> {
    match event {
        RoomEvent::ParticipantJoined(_) => {
            state.connected_participants += 1;
            vec![Effect::Persist]
        }
        RoomEvent::ParticipantLeft(_) => {
            state.connected_participants = state.connected_participants.saturating_sub(1);
            vec![Effect::Persist]
        }
        RoomEvent::Client {
            event: ClientEvent::StartGame,
            ..
        } => {
            if state.phase != Phase::Lobby || state.is_advancing() {
                return Vec::new();
            }
            advance_round(state, None, ctx)
        }
        RoomEvent::Client {
            participant,
            event: ClientEvent::Vote { choice },
        } => vote(state, participant, choice, ctx),
        RoomEvent::DeadlineFired { round } => {
            if state.phase != Phase::Voting
                || state.is_advancing()
                || round != state.round_number
            {
                tracing::debug!(round, current = state.round_number, "stale deadline ignored");
                return Vec::new();
            }
            resolve_votes(state, ctx)
        }
        RoomEvent::NarrationFinished { round, outcome } => {
            narration_finished(state, round, outcome, ctx)
        }
        RoomEvent::Resumed => resume(state, ctx),
    }
}

fn vote<R: Rng + ?Sized>(
    state: &mut RoomState,
    participant: ParticipantId,
    choice: OptionId,
    ctx: &mut TransitionContext<'_, R>,
) -> Vec<Effect> {
    if state.phase != Phase::Voting
        || state.is_advancing()
        || state.voted_participants.contains(&participant)
    {
        return Vec::new();
    }

    state.vote_tally.record(choice);
    state.voted_participants.insert(participant);
    let mut effects = vec![Effect::Persist];

    let turnout = state.voted_participants.len();
    if state.connected_participants > 0 && turnout >= state.connected_participants {
        tracing::debug!(turnout, round = state.round_number, "full turnout, resolving early");
        effects.push(Effect::CancelDeadline);
        effects.extend(resolve_votes(state, ctx));
    }
    effects
}

fn resolve_votes<R: Rng + ?Sized>(
    state: &mut RoomState,
    ctx: &mut TransitionContext<'_, R>,
) -> Vec<Effect> {
    let resolution = resolve(&state.narration_history, &state.vote_tally, &mut *ctx.rng);
    tracing::info!(
        round = state.round_number,
        option = %resolution.option,
        label = %resolution.label,
        "voting resolved"
    );
    advance_round(state, Some(resolution.label), ctx)
}

fn advance_round<R: Rng + ?Sized>(
    state: &mut RoomState,
    chosen: Option<String>,
    ctx: &mut TransitionContext<'_, R>,
) -> Vec<Effect> {
    if state.is_advancing() || state.phase.is_terminal() {
        return Vec::new();
    }

    state.round_number += 1;
    let round = state.round_number;
    state.advance = Advance::Advancing { round };

    state.narration_history.push(match &chosen {
        Some(label) => choice_turn(label),
        None => Turn::system(OPENING_TURN),
    });
    state.phase = Phase::Narrating;
    state.vote_tally.reset();
    state.voted_participants.clear();
    state.voting_deadline = None;

    let prompt = build_prompt(
        &ctx.config.system_prompt,
        &state.narration_history,
        chosen.as_deref(),
    );
    tracing::info!(round, "round advanced");
    vec![Effect::Persist, Effect::RequestNarration { round, prompt }]
}

fn narration_finished<R: Rng + ?Sized>(
    state: &mut RoomState,
    round: u64,
    outcome: Result<String, NarrationError>,
    ctx: &mut TransitionContext<'_, R>,
) -> Vec<Effect> {
    if state.advance != (Advance::Advancing { round }) {
        tracing::debug!(round, current = state.round_number, "stale narration ignored");
        return Vec::new();
    }
    state.advance = Advance::Idle;

    match outcome {
        Ok(text) => {
            let (text, found) = directives::parse(&text);
            let outcome = directives::apply(&mut state.party, &found);
            state.narration_history.push(Turn::narrator(text));

            match outcome {
                Outcome::Continue => open_voting(state, ctx),
                Outcome::Defeat | Outcome::Victory => {
                    state.phase = if outcome == Outcome::Victory {
                        Phase::Victory
                    } else {
                        Phase::GameOver
                    };
                    state.voting_deadline = None;
                    tracing::info!(round, phase = %state.phase, "game ended");
                    vec![Effect::Persist]
                }
            }
        }
        Err(err) => {
            tracing::warn!(round, error = %err, "narration failed, using fallback");
            state
                .narration_history
                .push(Turn::narrator(ctx.config.fallback_narration.clone()));
            open_voting(state, ctx)
        }
    }
}

fn open_voting<R: Rng + ?Sized>(
    state: &mut RoomState,
    ctx: &mut TransitionContext<'_, R>,
) -> Vec<Effect> {
    let at = ctx.config.deadline_after(ctx.now);

    state.phase = Phase::Voting;
    state.voting_deadline = Some(at);
    vec![
        Effect::ArmDeadline {
            at,
            round: state.round_number,
        },
        Effect::Persist,
    ]
}

/// Picks up work a persisted room was in the middle of.
fn resume<R: Rng + ?Sized>(
    state: &mut RoomState,
    ctx: &mut TransitionContext<'_, R>,
) -> Vec<Effect> {
    // Nobody reconnects to a fresh actor before it starts.
    state.connected_participants = 0;
    let round = state.round_number;

    match state.phase {
        Phase::Narrating if !state.is_advancing() => {
            state.advance = Advance::Advancing { round };
            let prompt = build_prompt(
                &ctx.config.system_prompt,
                &state.narration_history,
                pending_action(&state.narration_history),
            );
            tracing::info!(round, "resuming interrupted narration");
            vec![Effect::RequestNarration { round, prompt }]
        }
        Phase::Voting => {
            // Participant ids are not stable across restarts, so the old
            // voters cannot be matched to anyone who reconnects.
            state.vote_tally.reset();
            state.voted_participants.clear();
            tracing::info!(round, "reopening voting window");
            open_voting(state, ctx)
        }
        _ => Vec::new(),
    }
}
