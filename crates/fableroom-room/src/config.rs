//! Room configuration.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Instructions sent as the first prompt turn of every narration request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are the narrator of a collaborative text adventure played by a group of \
friends who vote on what the party does next. Write the next story segment \
in second person plural, two to four short paragraphs, vivid but brief.

End every segment with exactly three numbered options, one per line, in \
this form:
1. [short action]
2. [short action]
3. [short action]

You may embed these tags anywhere in the segment:
[HP:-N] or [HP:+N] when the party is hurt or healed,
[ITEM:+name] or [ITEM:-name] when the party gains or loses an item,
[GAME_OVER] when the party is defeated,
[VICTORY] when the quest is complete.
When the story ends, do not offer options.";

/// Narration used when the generator fails; always carries three options.
pub const DEFAULT_FALLBACK_NARRATION: &str = "\
The narrator pauses, gathering the scattered threads of the tale. The way \
ahead is uncertain, but the party presses on.
1. [Press onward]
2. [Look around carefully]
3. [Rest and regroup]";

/// Settings shared by every room a registry spawns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// How long a voting window stays open before it auto-resolves.
    pub voting_window: Duration,

    /// How long a narration request may run before the room falls back.
    pub narration_timeout: Duration,

    /// Party health at the start of a game.
    pub starting_health: i32,

    /// First prompt turn of every narration request.
    pub system_prompt: String,

    /// Narrator turn appended when the generator fails.
    pub fallback_narration: String,

    /// Bound of each room actor's command channel.
    pub channel_size: usize,
}

impl RoomConfig {
    /// When a voting window opened at `now` closes. A window too long to
    /// represent closes at the end of time.
    pub fn deadline_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::from_std(self.voting_window)
            .ok()
            .and_then(|window| now.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            voting_window: Duration::from_secs(20),
            narration_timeout: Duration::from_secs(45),
            starting_health: 100,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            fallback_narration: DEFAULT_FALLBACK_NARRATION.to_string(),
            channel_size: 64,
        }
    }
}
