use std::sync::LazyLock;

use regex::Regex;

use super::fountain::TRANSITION_KEYWORDS;
use super::lines::{is_upper, split_lines, strip_transition_marker, ClassifiedLine, LineKind, RawLine, ScreenplayDocument};

static SCENE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(INT|EXT|I/E|INT/EXT)\.?\s+").unwrap());

/// TV transcripts indent cues by at least this many columns.
pub const TRANSCRIPT_CUE_INDENT: usize = 4;
/// Cues (standalone or inline before a colon) are shorter than this.
pub const TRANSCRIPT_CUE_MAX_LEN: usize = 40;

type Rule = (LineKind, fn(&RawLine) -> bool);

/// First match wins. Keyword transitions are checked before inline cues so
/// `FADE IN:` and `CUT TO:` are not read as speakers.
const RULES: &[Rule] = &[
    (LineKind::Blank, is_blank),
    (LineKind::SceneHeading, is_scene_heading),
    (LineKind::Character, is_cue),
    (LineKind::Transition, is_keyword_transition),
    (LineKind::Character, is_inline_cue),
];

fn is_blank(line: &RawLine) -> bool {
    line.is_blank()
}

fn is_scene_heading(line: &RawLine) -> bool {
    SCENE_RE.is_match(line.trimmed())
}

fn is_cue(line: &RawLine) -> bool {
    let t = line.trimmed();
    line.indent >= TRANSCRIPT_CUE_INDENT
        && is_upper(t)
        && !t.contains(':')
        && t.chars().count() < TRANSCRIPT_CUE_MAX_LEN
}

fn is_keyword_transition(line: &RawLine) -> bool {
    let t = line.trimmed();
    is_upper(t) && TRANSITION_KEYWORDS.iter().any(|kw| t.contains(kw))
}

fn is_inline_cue(line: &RawLine) -> bool {
    split_inline_cue(line.trimmed()).is_some()
}

/// `CARTMAN: Screw you guys.` → `("CARTMAN", "Screw you guys.")`.
pub fn split_inline_cue(t: &str) -> Option<(&str, &str)> {
    let (name, speech) = t.split_once(':')?;
    let name = name.trim();
    (is_upper(name) && name.chars().count() < TRANSCRIPT_CUE_MAX_LEN).then(|| (name, speech.trim()))
}

/// Classify one transcript line into `out`. An inline `NAME: text` line
/// yields a cue followed by its dialogue; every other line yields one entry.
fn push_classified(line: &RawLine, out: &mut Vec<ClassifiedLine>) {
    let kind = RULES
        .iter()
        .find(|(_, matches)| matches(line))
        .map(|(kind, _)| *kind)
        .unwrap_or(LineKind::Action);

    let t = line.trimmed();
    match kind {
        LineKind::Blank => out.push(ClassifiedLine::blank()),
        LineKind::SceneHeading => out.push(ClassifiedLine::new(kind, t.to_uppercase())),
        LineKind::Transition => out.push(ClassifiedLine::new(kind, strip_transition_marker(t))),
        // Standalone cues never contain a colon, so only inline cues split.
        LineKind::Character => match split_inline_cue(t) {
            Some((name, speech)) => {
                out.push(ClassifiedLine::new(LineKind::Character, name));
                if !speech.is_empty() {
                    out.push(ClassifiedLine::new(LineKind::Dialogue, speech));
                }
            }
            None => out.push(ClassifiedLine::new(kind, t)),
        },
        _ => out.push(ClassifiedLine::new(kind, t)),
    }
}

/// Classify the extracted `<pre>` body of a TV transcript page.
pub fn classify_transcript(text: &str) -> ScreenplayDocument {
    let lines = split_lines(text);
    let mut out = Vec::with_capacity(lines.len());
    for line in &lines {
        push_classified(line, &mut out);
    }
    ScreenplayDocument::new(out)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(text: &str) -> Vec<(LineKind, String)> {
        classify_transcript(text)
            .lines
            .into_iter()
            .map(|l| (l.kind, l.content))
            .collect()
    }

    #[test]
    fn indented_cue_then_speech() {
        assert_eq!(
            classified("    STAN\nDude, this is pretty messed up."),
            vec![
                (LineKind::Character, "STAN".to_string()),
                (LineKind::Action, "Dude, this is pretty messed up.".to_string()),
            ]
        );
    }

    #[test]
    fn inline_cue_splits_in_two() {
        assert_eq!(
            classified("CARTMAN: Screw you guys, I'm going home."),
            vec![
                (LineKind::Character, "CARTMAN".to_string()),
                (LineKind::Dialogue, "Screw you guys, I'm going home.".to_string()),
            ]
        );
        assert_eq!(classified("KYLE:"), vec![(LineKind::Character, "KYLE".to_string())]);
    }

    #[test]
    fn mixed_case_colon_is_action() {
        assert_eq!(
            classified("Later that day: the bus stop."),
            vec![(LineKind::Action, "Later that day: the bus stop.".to_string())]
        );
    }

    #[test]
    fn cue_limits() {
        // Too close to the margin for a standalone cue.
        assert_eq!(classified("  KENNY")[0].0, LineKind::Action);
        let long = format!("    {}", "A".repeat(TRANSCRIPT_CUE_MAX_LEN));
        assert_eq!(classified(&long)[0].0, LineKind::Action);
    }

    #[test]
    fn transitions_win_over_inline_cues() {
        assert_eq!(classified("FADE IN:"), vec![(LineKind::Transition, "FADE IN:".to_string())]);
        assert_eq!(classified("CUT TO:")[0].0, LineKind::Transition);
        assert_eq!(classified("DISSOLVE TO BLACK")[0].0, LineKind::Transition);
    }

    #[test]
    fn scene_headings_upper_case() {
        assert_eq!(
            classified("int. south park elementary - day"),
            vec![(LineKind::SceneHeading, "INT. SOUTH PARK ELEMENTARY - DAY".to_string())]
        );
    }

    #[test]
    fn one_entry_per_line_except_inline_cues() {
        let doc = classify_transcript("    STAN\nHey.\n\nKYLE: Hi.\nEXT. BUS STOP - DAY");
        assert_eq!(doc.lines.len(), 6);
        assert_eq!(doc.count(LineKind::Character), 2);
        assert_eq!(doc.count(LineKind::Dialogue), 1);
    }
}
