//! Locating the numbered option list at the end of a narration.
//!
//! Generated text is free-form, so this is best effort: a label that cannot
//! be found is `None` and the caller substitutes `Option N`.

use std::sync::LazyLock;

use fableroom_protocol::OptionId;
use regex::Regex;

/// `1. [Label]`, `2) Label`, `- 3: Label`, `**1.** [Label]` and friends.
static OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*]\s+)?(?:\*\*)?\s*([1-3])\s*[.):](?:\*\*)?\s*(.+?)\s*$")
        .expect("option line pattern is valid")
});

/// Splits an option line into its number and raw label text.
fn parse_option_line(line: &str) -> Option<(u8, &str)> {
    let caps = OPTION_LINE.captures(line)?;
    let number = caps.get(1)?.as_str().parse().ok()?;
    Some((number, caps.get(2)?.as_str()))
}

/// Removes bold markers and, when present, the `[...]` bracket around a label.
fn clean_label(raw: &str) -> Option<String> {
    let raw = raw.trim_matches('*').trim();
    let label = match raw.strip_prefix('[') {
        Some(rest) => rest.split(']').next().unwrap_or(rest),
        None => raw,
    };
    let label = label.trim().trim_matches('*').trim();
    (!label.is_empty()).then(|| label.to_string())
}

/// Finds the label of `option` in a narration's option list.
///
/// When the number appears more than once, the last occurrence wins since
/// the options close the segment.
pub fn extract_label(narration: &str, option: OptionId) -> Option<String> {
    narration
        .lines()
        .filter_map(parse_option_line)
        .filter(|(number, _)| *number == option.number())
        .last()
        .and_then(|(_, raw)| clean_label(raw))
}

/// Drops option lines from a narration, keeping the story text.
///
/// Used on earlier narrator turns before they are replayed as model context.
pub fn strip_option_lines(narration: &str) -> String {
    let kept: Vec<&str> = narration
        .lines()
        .filter(|line| parse_option_line(line).is_none())
        .collect();
    kept.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NARRATION: &str = "The bridge sways above the gorge.\n\
        1. [Cross carefully]\n\
        2. [Cut the ropes]\n\
        3. [Turn back]";

    #[test]
    fn test_extract_bracketed_labels() {
        assert_eq!(extract_label(NARRATION, OptionId::One).as_deref(), Some("Cross carefully"));
        assert_eq!(extract_label(NARRATION, OptionId::Two).as_deref(), Some("Cut the ropes"));
        assert_eq!(extract_label(NARRATION, OptionId::Three).as_deref(), Some("Turn back"));
    }

    #[test]
    fn test_extract_plain_and_paren_labels() {
        let text = "Choose:\n1) Run for the door\n2. Hide under the table\n3: Shout for help";
        assert_eq!(extract_label(text, OptionId::One).as_deref(), Some("Run for the door"));
        assert_eq!(extract_label(text, OptionId::Two).as_deref(), Some("Hide under the table"));
        assert_eq!(extract_label(text, OptionId::Three).as_deref(), Some("Shout for help"));
    }

    #[test]
    fn test_extract_markdown_bold_and_bullets() {
        let text = "**1.** [Open the gate]\n- 2. **Climb the wall**\n* 3) **[Wait for dusk]** (safest)";
        assert_eq!(extract_label(text, OptionId::One).as_deref(), Some("Open the gate"));
        assert_eq!(extract_label(text, OptionId::Two).as_deref(), Some("Climb the wall"));
        assert_eq!(extract_label(text, OptionId::Three).as_deref(), Some("Wait for dusk"));
    }

    #[test]
    fn test_extract_prefers_last_occurrence() {
        let text = "1. First, the dragon woke.\nThen it spoke.\n1. [Answer the dragon]\n2. [Flee]";
        assert_eq!(extract_label(text, OptionId::One).as_deref(), Some("Answer the dragon"));
    }

    #[test]
    fn test_extract_missing_option_is_none() {
        assert_eq!(extract_label("No options here.", OptionId::One), None);
        assert_eq!(extract_label("1. [A]\n2. [B]", OptionId::Three), None);
        assert_eq!(extract_label("1. []", OptionId::One), None);
    }

    #[test]
    fn test_strip_option_lines_keeps_story() {
        assert_eq!(strip_option_lines(NARRATION), "The bridge sways above the gorge.");
    }

    #[test]
    fn test_strip_option_lines_without_options_is_identity() {
        let text = "Line one.\n\nLine two.";
        assert_eq!(strip_option_lines(text), text);
    }
}
