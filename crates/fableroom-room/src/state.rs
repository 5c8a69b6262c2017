//! The per-room aggregate.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use fableroom_protocol::{
    ParticipantId, PartyStats, Phase, RoomSnapshot, Turn, VoteTally,
};
use serde::{Deserialize, Serialize};

/// Whether a round advance is in flight.
///
/// Held from the moment a round starts until the generator's completion for
/// that round is applied. While `Advancing`, starts, votes and deadline
/// firings are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Advance {
    #[default]
    Idle,
    Advancing { round: u64 },
}

/// Everything a room knows. Owned by exactly one room actor.
///
/// Fields are only mutated by [`transition`](crate::transition); outside
/// the crate the state is read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub(crate) narration_history: Vec<Turn>,
    pub(crate) phase: Phase,
    pub(crate) vote_tally: VoteTally,
    pub(crate) voted_participants: BTreeSet<ParticipantId>,
    pub(crate) connected_participants: usize,
    pub(crate) voting_deadline: Option<DateTime<Utc>>,
    pub(crate) round_number: u64,
    pub(crate) party: PartyStats,
    /// Never persisted: an advance cannot survive the actor that ran it.
    #[serde(skip)]
    pub(crate) advance: Advance,
}

impl RoomState {
    /// A fresh room in the lobby with the party at `starting_health`.
    pub fn new(starting_health: i32) -> Self {
        Self {
            narration_history: Vec::new(),
            phase: Phase::Lobby,
            vote_tally: VoteTally::zeroed(),
            voted_participants: BTreeSet::new(),
            connected_participants: 0,
            voting_deadline: None,
            round_number: 0,
            party: PartyStats::new(starting_health),
            advance: Advance::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &[Turn] {
        &self.narration_history
    }

    pub fn tally(&self) -> &VoteTally {
        &self.vote_tally
    }

    pub fn voted(&self) -> &BTreeSet<ParticipantId> {
        &self.voted_participants
    }

    pub fn has_voted(&self, participant: ParticipantId) -> bool {
        self.voted_participants.contains(&participant)
    }

    pub fn connected(&self) -> usize {
        self.connected_participants
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.voting_deadline
    }

    pub fn round(&self) -> u64 {
        self.round_number
    }

    pub fn party(&self) -> &PartyStats {
        &self.party
    }

    pub fn advance(&self) -> Advance {
        self.advance
    }

    pub fn is_advancing(&self) -> bool {
        matches!(self.advance, Advance::Advancing { .. })
    }

    /// What clients see after each mutation.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            phase: self.phase,
            vote_tally: self.vote_tally.clone(),
            voted_count: self.voted_participants.len(),
            connected_participants: self.connected_participants,
            narration_history: self.narration_history.clone(),
            voting_deadline: self.voting_deadline,
            round_number: self.round_number,
            party: self.party.clone(),
        }
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new(PartyStats::default().max_health)
    }
}
