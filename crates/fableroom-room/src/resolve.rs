//! Picking the winning option when a voting window closes.

use fableroom_protocol::{OptionId, Speaker, Turn, VoteTally};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::options::extract_label;

/// The option a round settled on and the action text it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub option: OptionId,
    pub label: String,
}

/// Returns the option with the highest tally.
///
/// Ties are broken uniformly at random among the tied options, so a round
/// with no votes at all picks any of the three.
pub fn pick_winner<R: Rng + ?Sized>(tally: &VoteTally, rng: &mut R) -> OptionId {
    tally
        .leaders()
        .choose(rng)
        .copied()
        .unwrap_or(OptionId::One)
}

/// The label of `option` in the most recent narrator turn, or `Option N`.
pub fn label_for(history: &[Turn], option: OptionId) -> String {
    history
        .iter()
        .rev()
        .find(|turn| turn.speaker == Speaker::Narrator)
        .and_then(|turn| extract_label(&turn.text, option))
        .unwrap_or_else(|| format!("Option {}", option.number()))
}

/// Closes a voting window: winner plus its human-readable label.
pub fn resolve<R: Rng + ?Sized>(
    history: &[Turn],
    tally: &VoteTally,
    rng: &mut R,
) -> Resolution {
    let option = pick_winner(tally, rng);
    Resolution {
        option,
        label: label_for(history, option),
    }
}
