//! Building the generator input from a room's history.

use fableroom_narrator::PromptTurn;
use fableroom_protocol::{Speaker, Turn};

use crate::options::strip_option_lines;

/// Prefix of the player turn recorded when a round resolves.
pub const CHOICE_PREFIX: &str = "The party chose: ";

/// System turn recorded when a game starts.
pub const OPENING_TURN: &str = "The adventure begins.";

/// The player turn recording a resolved choice.
pub fn choice_turn(label: &str) -> Turn {
    Turn::player(format!("{CHOICE_PREFIX}{label}"))
}

/// The action still waiting for narration, read back from the last turn.
///
/// `None` means the opening segment is owed.
pub fn pending_action(history: &[Turn]) -> Option<&str> {
    let last = history.last()?;
    match last.speaker {
        Speaker::Player => Some(last.text.strip_prefix(CHOICE_PREFIX).unwrap_or(&last.text)),
        _ => None,
    }
}

/// Assembles the conversation for one narration request.
///
/// Narrator turns become assistant messages with their option lists
/// removed; player and system turns become user messages. A final user
/// message tells the model what to narrate now.
pub fn build_prompt(
    system_prompt: &str,
    history: &[Turn],
    action: Option<&str>,
) -> Vec<PromptTurn> {
    let mut prompt = Vec::with_capacity(history.len() + 2);
    prompt.push(PromptTurn::system(system_prompt));

    for turn in history {
        prompt.push(match turn.speaker {
            Speaker::Narrator => PromptTurn::assistant(strip_option_lines(&turn.text)),
            Speaker::Player | Speaker::System => PromptTurn::user(turn.text.clone()),
        });
    }

    prompt.push(PromptTurn::user(match action {
        Some(label) => format!(
            "The party has decided: \"{label}\". Narrate what happens next and \
             end with three new numbered options."
        ),
        None => "Begin the adventure. Set the scene for the party and end with \
                 the first three numbered options."
            .to_string(),
    }));
    prompt
}
