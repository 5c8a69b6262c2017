//! Core protocol types for Fableroom's wire format.
//!
//! Everything here is serialized to JSON and sent between a room and its
//! browser clients. The JSON shapes are part of the client contract, so the
//! tests at the bottom pin them down.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one participant connection inside a room.
///
/// Assigned by the server per connection, never chosen by the client, so a
/// client cannot vote twice by claiming a second identity on the same
/// socket. Serialized as a plain number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The code a room is addressed by (the last segment of the connection path).
///
/// Codes are case-insensitive: `RoomCode::new("Dragon")` and
/// `RoomCode::new("dragon")` name the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Code used when a connection arrives without one.
    pub const DEFAULT: &'static str = "lobby";

    /// Normalizes and wraps a room code. Blank input maps to [`Self::DEFAULT`].
    pub fn new(code: impl AsRef<str>) -> Self {
        let code = code.as_ref().trim();
        if code.is_empty() {
            Self(Self::DEFAULT.to_string())
        } else {
            Self(code.to_lowercase())
        }
    }

    /// Borrows the normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Options and votes
// ---------------------------------------------------------------------------

/// One of the three narrative options offered each round.
///
/// On the wire these are the strings `"1"`, `"2"` and `"3"`. Anything else
/// fails to deserialize, which is how out-of-range votes get dropped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum OptionId {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
}

impl OptionId {
    /// All options, in display order.
    pub const ALL: [OptionId; 3] = [OptionId::One, OptionId::Two, OptionId::Three];

    /// The option's 1-based number as shown in narration.
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Per-option vote counts for the current voting window.
///
/// Always holds exactly the three option keys, including after
/// deserializing a partial map. Serialized as `{"1":0,"2":0,"3":0}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<OptionId, u32>", into = "BTreeMap<OptionId, u32>")]
pub struct VoteTally(BTreeMap<OptionId, u32>);

impl VoteTally {
    /// A tally with every option at zero.
    pub fn zeroed() -> Self {
        Self(OptionId::ALL.iter().map(|o| (*o, 0)).collect())
    }

    /// Adds one vote for `option`.
    pub fn record(&mut self, option: OptionId) {
        *self.0.entry(option).or_insert(0) += 1;
    }

    /// Votes for a single option.
    pub fn count(&self, option: OptionId) -> u32 {
        self.0.get(&option).copied().unwrap_or(0)
    }

    /// Total votes cast.
    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    /// The highest count held by any option.
    pub fn max(&self) -> u32 {
        self.0.values().copied().max().unwrap_or(0)
    }

    /// Every option whose count equals [`Self::max`], in option order.
    pub fn leaders(&self) -> Vec<OptionId> {
        let max = self.max();
        OptionId::ALL
            .iter()
            .copied()
            .filter(|o| self.count(*o) == max)
            .collect()
    }

    /// Resets every option to zero.
    pub fn reset(&mut self) {
        *self = Self::zeroed();
    }
}

impl Default for VoteTally {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl From<BTreeMap<OptionId, u32>> for VoteTally {
    fn from(map: BTreeMap<OptionId, u32>) -> Self {
        let mut tally = Self::zeroed();
        for (option, count) in map {
            tally.0.insert(option, count);
        }
        tally
    }
}

impl From<VoteTally> for BTreeMap<OptionId, u32> {
    fn from(tally: VoteTally) -> Self {
        tally.0
    }
}

// ---------------------------------------------------------------------------
// Phase and history
// ---------------------------------------------------------------------------

/// The coarse state of a room's game loop.
///
/// ```text
/// Lobby → Narrating → Voting → Narrating → … → GameOver | Victory
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Waiting for someone to start the story.
    #[default]
    Lobby,
    /// A narration request is in flight.
    Narrating,
    /// Participants are choosing the next action.
    Voting,
    /// The party was defeated. Terminal.
    GameOver,
    /// The party won. Terminal.
    Victory,
}

impl Phase {
    /// Returns `true` for phases no event can leave.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "LOBBY",
            Self::Narrating => "NARRATING",
            Self::Voting => "VOTING",
            Self::GameOver => "GAME_OVER",
            Self::Victory => "VICTORY",
        };
        f.write_str(name)
    }
}

/// Who a history entry is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Speaker {
    System,
    Player,
    Narrator,
}

/// One entry in a room's narration history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::System,
            text: text.into(),
        }
    }

    pub fn player(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Player,
            text: text.into(),
        }
    }

    pub fn narrator(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Narrator,
            text: text.into(),
        }
    }
}

/// Party progress tracked from directives embedded in narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyStats {
    pub health: i32,
    pub max_health: i32,
    pub inventory: Vec<String>,
}

impl PartyStats {
    /// Full health, empty inventory.
    pub fn new(max_health: i32) -> Self {
        Self {
            health: max_health,
            max_health,
            inventory: Vec::new(),
        }
    }
}

impl Default for PartyStats {
    fn default() -> Self {
        Self::new(100)
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Messages a client sends to its room.
///
/// Internally tagged, so the wire form is `{"type":"START_GAME"}` and
/// `{"type":"VOTE","choice":"2"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientEvent {
    /// Leave the lobby and begin the story.
    StartGame,
    /// Vote for one of the current options.
    Vote { choice: OptionId },
}

/// A full picture of a room, pushed to every client after each mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub phase: Phase,
    pub vote_tally: VoteTally,
    /// How many participants have voted this round (ids are not exposed).
    pub voted_count: usize,
    pub connected_participants: usize,
    pub narration_history: Vec<Turn>,
    /// Epoch milliseconds, `null` outside of `VOTING`.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub voting_deadline: Option<DateTime<Utc>>,
    pub round_number: u64,
    pub party: PartyStats,
}

/// Messages a room sends to its clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// The room changed; here is all of it.
    State { state: RoomSnapshot },
}

// =========================================================================
// Tests
// =========================================================================
