//! Game-progress tags embedded in narration text.
//!
//! The narrator may write `[HP:-10]`, `[ITEM:+Rope]`, `[GAME_OVER]` or
//! `[VICTORY]` anywhere in a segment. Tags are stripped from the text that
//! players see and applied to the party.

use std::sync::LazyLock;

use fableroom_protocol::PartyStats;
use regex::Regex;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\s*(HP|ITEM|GAME[ _]OVER|VICTORY)\s*(?::\s*([^\]]*?))?\s*\]")
        .expect("directive pattern is valid")
});

/// One parsed tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Health(i32),
    Gain(String),
    Lose(String),
    GameOver,
    Victory,
}

/// What the directives of a segment mean for the game as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Defeat,
    Victory,
}

fn parse_one(kind: &str, arg: Option<&str>) -> Option<Directive> {
    let kind = kind.to_ascii_uppercase();
    match kind.as_str() {
        "HP" => arg?.replace(' ', "").parse().ok().map(Directive::Health),
        "ITEM" => {
            let arg = arg?.trim();
            if let Some(name) = arg.strip_prefix('-') {
                let name = name.trim();
                (!name.is_empty()).then(|| Directive::Lose(name.to_string()))
            } else {
                let name = arg.strip_prefix('+').unwrap_or(arg).trim();
                (!name.is_empty()).then(|| Directive::Gain(name.to_string()))
            }
        }
        "VICTORY" => Some(Directive::Victory),
        _ => Some(Directive::GameOver),
    }
}

/// Extracts every tag from `text`, returning the text with tags removed.
///
/// Malformed tags (`[HP:lots]`) are removed but produce no directive.
pub fn parse(text: &str) -> (String, Vec<Directive>) {
    let directives = DIRECTIVE
        .captures_iter(text)
        .filter_map(|caps| {
            let kind = caps.get(1)?.as_str();
            parse_one(kind, caps.get(2).map(|m| m.as_str()))
        })
        .collect();

    let stripped = DIRECTIVE.replace_all(text, "");
    let cleaned: Vec<&str> = stripped.lines().map(str::trim_end).collect();
    (cleaned.join("\n").trim().to_string(), directives)
}

/// Applies directives to the party and decides whether the game goes on.
///
/// Health is clamped to `0..=max_health`. Victory beats defeat when a
/// segment carries both.
pub fn apply(party: &mut PartyStats, directives: &[Directive]) -> Outcome {
    let mut victory = false;
    let mut defeat = false;

    for directive in directives {
        match directive {
            Directive::Health(delta) => {
                party.health = party
                    .health
                    .saturating_add(*delta)
                    .clamp(0, party.max_health);
            }
            Directive::Gain(item) => {
                if !party.inventory.iter().any(|i| i.eq_ignore_ascii_case(item)) {
                    party.inventory.push(item.clone());
                }
            }
            Directive::Lose(item) => {
                party.inventory.retain(|i| !i.eq_ignore_ascii_case(item));
            }
            Directive::GameOver => defeat = true,
            Directive::Victory => victory = true,
        }
    }

    if victory {
        Outcome::Victory
    } else if defeat || party.health <= 0 {
        Outcome::Defeat
    } else {
        Outcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_tags_and_collects_directives() {
        let (text, directives) =
            parse("A goblin bites you! [HP:-10]\nYou grab its dagger. [ITEM:+Dagger]\n1. [Run]");
        assert_eq!(text, "A goblin bites you!\nYou grab its dagger.\n1. [Run]");
        assert_eq!(
            directives,
            vec![Directive::Health(-10), Directive::Gain("Dagger".into())]
        );
    }

    #[test]
    fn test_parse_is_case_insensitive_and_lenient() {
        let (_, directives) =
            parse("[hp: +5] [Item: - Old Map] [game over] [Victory] [ITEM:Lantern]");
        assert_eq!(
            directives,
            vec![
                Directive::Health(5),
                Directive::Lose("Old Map".into()),
                Directive::GameOver,
                Directive::Victory,
                Directive::Gain("Lantern".into()),
            ]
        );
    }

    #[test]
    fn test_parse_drops_malformed_tags() {
        let (text, directives) = parse("Ouch. [HP:lots] [ITEM:]");
        assert_eq!(text, "Ouch.");
        assert!(directives.is_empty());
    }

    #[test]
    fn test_option_brackets_are_not_directives() {
        let (text, directives) = parse("1. [Heal the wounded]\n2. [Hold position]");
        assert!(directives.is_empty());
        assert_eq!(text, "1. [Heal the wounded]\n2. [Hold position]");
    }

    #[test]
    fn test_apply_clamps_health() {
        let mut party = PartyStats::new(50);
        assert_eq!(apply(&mut party, &[Directive::Health(30)]), Outcome::Continue);
        assert_eq!(party.health, 50);
        assert_eq!(apply(&mut party, &[Directive::Health(-20)]), Outcome::Continue);
        assert_eq!(party.health, 30);
    }

    #[test]
    fn test_apply_zero_health_is_defeat() {
        let mut party = PartyStats::new(20);
        assert_eq!(apply(&mut party, &[Directive::Health(-999)]), Outcome::Defeat);
        assert_eq!(party.health, 0);
    }

    #[test]
    fn test_apply_victory_beats_defeat() {
        let mut party = PartyStats::new(20);
        let outcome = apply(&mut party, &[Directive::GameOver, Directive::Victory]);
        assert_eq!(outcome, Outcome::Victory);
    }

    #[test]
    fn test_apply_inventory_dedupes_and_removes() {
        let mut party = PartyStats::new(10);
        apply(
            &mut party,
            &[
                Directive::Gain("Rope".into()),
                Directive::Gain("rope".into()),
                Directive::Gain("Torch".into()),
            ],
        );
        assert_eq!(party.inventory, vec!["Rope".to_string(), "Torch".to_string()]);
        apply(&mut party, &[Directive::Lose("ROPE".into())]);
        assert_eq!(party.inventory, vec!["Torch".to_string()]);
    }
}
