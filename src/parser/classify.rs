use std::sync::LazyLock;

use regex::Regex;

use super::lines::{is_upper, split_lines, strip_transition_marker, ClassifiedLine, LineKind, RawLine, ScreenplayDocument};

static SCENE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+\s+)?(INT|EXT|I/E|INT/EXT)\.?\s+").unwrap());
static SCENE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\s+").unwrap());

// Column thresholds tuned against IMSDb's <pre> layout.

/// Upper-case lines at or past this column are character cues.
pub const CHARACTER_INDENT: usize = 20;
/// Mixed-case lines from this column up to `CHARACTER_INDENT` are dialogue.
pub const DIALOGUE_INDENT: usize = 10;
/// Parentheticals sit between `DIALOGUE_INDENT` and this column.
pub const PARENTHETICAL_MAX_INDENT: usize = 25;
/// Shorter scripts put cues in a looser band starting here...
pub const LOOSE_CHARACTER_INDENT: usize = 4;
/// ...and ending at `DIALOGUE_INDENT`, for cues shorter than this.
pub const LOOSE_CHARACTER_MAX_LEN: usize = 30;

type Rule = (LineKind, fn(&RawLine) -> bool);

/// Evaluated top to bottom, first match wins. Order matters: a short
/// upper-case line can satisfy both character bands.
const RULES: &[Rule] = &[
    (LineKind::Blank, is_blank),
    (LineKind::SceneHeading, is_scene_heading),
    (LineKind::Transition, is_transition),
    (LineKind::Character, is_character),
    (LineKind::Dialogue, is_dialogue),
    (LineKind::Parenthetical, is_parenthetical),
    (LineKind::Character, is_loose_character),
];

fn is_blank(line: &RawLine) -> bool {
    line.is_blank()
}

fn is_scene_heading(line: &RawLine) -> bool {
    SCENE_RE.is_match(line.trimmed())
}

fn is_transition(line: &RawLine) -> bool {
    let t = strip_transition_marker(line.trimmed());
    is_upper(t) && (t.ends_with(':') || t.contains(" TO:") || t.starts_with("FADE TO"))
}

fn is_character(line: &RawLine) -> bool {
    line.indent >= CHARACTER_INDENT && is_upper(line.trimmed())
}

fn is_dialogue(line: &RawLine) -> bool {
    (DIALOGUE_INDENT..CHARACTER_INDENT).contains(&line.indent) && !is_upper(line.trimmed())
}

fn is_parenthetical(line: &RawLine) -> bool {
    let t = line.trimmed();
    (DIALOGUE_INDENT..PARENTHETICAL_MAX_INDENT).contains(&line.indent)
        && t.starts_with('(')
        && t.ends_with(')')
}

fn is_loose_character(line: &RawLine) -> bool {
    let t = line.trimmed();
    (LOOSE_CHARACTER_INDENT..DIALOGUE_INDENT).contains(&line.indent)
        && is_upper(t)
        && t.chars().count() < LOOSE_CHARACTER_MAX_LEN
}

/// Classify one line of extracted `<pre>` text. Falls back to `Action`.
pub fn classify_line(line: &RawLine) -> ClassifiedLine {
    let kind = RULES
        .iter()
        .find(|(_, matches)| matches(line))
        .map(|(kind, _)| *kind)
        .unwrap_or(LineKind::Action);

    let trimmed = line.trimmed();
    let content = match kind {
        LineKind::Blank => String::new(),
        LineKind::SceneHeading => SCENE_NUMBER_RE.replace(trimmed, "").to_uppercase(),
        LineKind::Transition => strip_transition_marker(trimmed).to_string(),
        _ => trimmed.to_string(),
    };
    ClassifiedLine::new(kind, content)
}

pub fn classify_lines(text: &str) -> Vec<ClassifiedLine> {
    split_lines(text).iter().map(classify_line).collect()
}

pub fn classify_document(text: &str) -> ScreenplayDocument {
    ScreenplayDocument::new(classify_lines(text))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(line: &str) -> LineKind {
        classify_line(&RawLine::new(line)).kind
    }

    #[test]
    fn blank_lines() {
        assert_eq!(kind_of(""), LineKind::Blank);
        assert_eq!(kind_of("      "), LineKind::Blank);
    }

    #[test]
    fn scene_heading_strips_number_and_uppercases() {
        let c = classify_line(&RawLine::new("  12   int. the house - day"));
        assert_eq!(c.kind, LineKind::SceneHeading);
        assert_eq!(c.content, "INT. THE HOUSE - DAY");
    }

    #[test]
    fn scene_heading_prefixes() {
        assert_eq!(kind_of("EXT. BEACH - NIGHT"), LineKind::SceneHeading);
        assert_eq!(kind_of("I/E. CAR - MOVING"), LineKind::SceneHeading);
        assert_eq!(kind_of("INT/EXT. PORCH - DAWN"), LineKind::SceneHeading);
        assert_eq!(kind_of("INT KITCHEN - DAY"), LineKind::SceneHeading);
        assert_eq!(kind_of("INTERIOR decorating is hard"), LineKind::Action);
    }

    #[test]
    fn transitions() {
        let c = classify_line(&RawLine::new("                                   CUT TO:"));
        assert_eq!(c.kind, LineKind::Transition);
        assert_eq!(c.content, "CUT TO:");
        assert_eq!(kind_of("FADE IN:"), LineKind::Transition);
        assert_eq!(kind_of("FADE TO BLACK."), LineKind::Transition);
        assert_eq!(kind_of("MATCH CUT TO: THE MOON"), LineKind::Transition);
        assert_eq!(kind_of("Later, back to:"), LineKind::Action);
    }

    #[test]
    fn marked_transition_is_not_double_marked() {
        let c = classify_line(&RawLine::new("> CUT TO:"));
        assert_eq!(c.kind, LineKind::Transition);
        assert_eq!(c.content, "CUT TO:");
    }

    #[test]
    fn character_then_dialogue() {
        let lines = classify_lines("                      JOHN\n               Hello there.");
        assert_eq!(lines[0], ClassifiedLine::new(LineKind::Character, "JOHN"));
        assert_eq!(lines[1], ClassifiedLine::new(LineKind::Dialogue, "Hello there."));
    }

    #[test]
    fn parenthetical_band() {
        // 20..25 is past the dialogue band, so only the parenthetical rule applies.
        assert_eq!(kind_of("                    (beat)"), LineKind::Parenthetical);
        // Upper-case parentheticals in the dialogue band skip the dialogue rule.
        assert_eq!(kind_of("            (V.O.)"), LineKind::Parenthetical);
        // Mixed case inside the dialogue band resolves as dialogue first.
        assert_eq!(kind_of("            (quietly)"), LineKind::Dialogue);
        assert_eq!(kind_of("                          (beat)"), LineKind::Action);
    }

    #[test]
    fn loose_character_band() {
        assert_eq!(kind_of("      MARY"), LineKind::Character);
        assert_eq!(
            kind_of("      A VERY LONG UPPER CASE LINE OF SCREAMING"),
            LineKind::Action
        );
        assert_eq!(kind_of("      Mary walks in."), LineKind::Action);
    }

    #[test]
    fn upper_case_in_dialogue_band_is_action() {
        assert_eq!(kind_of("            BANG BANG"), LineKind::Action);
    }

    #[test]
    fn action_keeps_case_and_trims() {
        let c = classify_line(&RawLine::new("   The door Opens.   "));
        assert_eq!(c, ClassifiedLine::new(LineKind::Action, "The door Opens."));
    }

    #[test]
    fn one_line_in_one_line_out() {
        let text = "FADE IN:\n\n1 INT. HOUSE - DAY\n\n                      JOHN\n               Hi.\n\n\n";
        assert_eq!(classify_lines(text).len(), text.lines().count());
    }

    #[test]
    fn fixture_roles() {
        let html = std::fs::read_to_string("tests/fixtures/casablanca.html").unwrap();
        let body = crate::parser::extract::extract_body(&html).body;
        let doc = classify_document(&body);
        assert_eq!(doc.count(LineKind::SceneHeading), 2);
        assert_eq!(doc.count(LineKind::Transition), 2);
        assert!(doc.count(LineKind::Character) >= 3);
        assert_eq!(doc.count(LineKind::Parenthetical), 1);
        assert!(doc
            .lines
            .iter()
            .any(|l| l.kind == LineKind::SceneHeading && l.content == "INT. RICK'S CAFE - NIGHT"));
    }
}
