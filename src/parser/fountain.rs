use std::sync::LazyLock;

use regex::Regex;

use super::classify::{CHARACTER_INDENT, DIALOGUE_INDENT};
use super::lines::{is_upper, split_lines, strip_transition_marker, ClassifiedLine, LineKind, RawLine, ScreenplayDocument};

static SCENE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(INT|EXT|I/E|INT/EXT)\.?\s+").unwrap());

/// Runs of this many blank lines or more collapse to a single blank line.
pub const BLANK_RUN_COLLAPSE: usize = 3;
/// Character cues in Fountain text are shorter than this.
pub const FOUNTAIN_CHARACTER_MAX_LEN: usize = 40;

const TITLE_KEY: &str = "title:";
pub(super) const TRANSITION_KEYWORDS: &[&str] = &["FADE", "CUT TO", "DISSOLVE", "SMASH CUT"];

// ── Emitter ──

/// Serialize a document to Fountain text.
pub fn emit(doc: &ScreenplayDocument) -> String {
    let mut out: Vec<String> = Vec::with_capacity(doc.lines.len() + 2);
    let mut blank_run = 0;

    // A parsed document keeps its honored `Title:` line; the header replaces it.
    let honored = doc.title.as_ref().and_then(|title| {
        doc.lines
            .iter()
            .position(|l| l.kind == LineKind::Title && l.content == *title)
    });
    let mut lines: Vec<&ClassifiedLine> = doc
        .lines
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != honored)
        .map(|(_, l)| l)
        .collect();

    if let Some(title) = &doc.title {
        out.push(format!("Title: {}", title));
        out.push(String::new());
        // The separator replaces any leading blank lines.
        let body = lines
            .iter()
            .position(|l| l.kind != LineKind::Blank)
            .unwrap_or(lines.len());
        lines.drain(..body);
    }

    for line in lines {
        if line.kind == LineKind::Blank {
            blank_run += 1;
            continue;
        }
        push_blanks(&mut out, blank_run);
        blank_run = 0;
        out.push(render_line(line));
    }
    push_blanks(&mut out, blank_run);

    out.join("\n")
}

fn push_blanks(out: &mut Vec<String>, run: usize) {
    let keep = if run >= BLANK_RUN_COLLAPSE { 1 } else { run };
    out.extend(std::iter::repeat(String::new()).take(keep));
}

fn render_line(line: &ClassifiedLine) -> String {
    match line.kind {
        LineKind::SceneHeading => line.content.to_uppercase(),
        LineKind::Transition => format!("> {}", line.content),
        LineKind::Title => format!("Title: {}", line.content),
        LineKind::Centered => format!(">{}<", line.content),
        LineKind::Blank => String::new(),
        _ => line.content.clone(),
    }
}

// ── Parser ──

type Rule = (LineKind, fn(&RawLine, Option<&RawLine>) -> bool);

/// Reverse classification, first match wins. Only the character rule
/// looks at the next non-blank line.
const RULES: &[Rule] = &[
    (LineKind::Blank, is_blank),
    (LineKind::Title, is_title),
    (LineKind::SceneHeading, is_scene_heading),
    (LineKind::Centered, is_centered),
    (LineKind::Transition, is_keyword_transition),
    (LineKind::Transition, is_marked_transition),
    (LineKind::Character, is_character_cue),
    (LineKind::Parenthetical, is_parenthetical),
    (LineKind::Character, is_indented_character),
    (LineKind::Dialogue, is_indented_dialogue),
];

fn is_blank(line: &RawLine, _: Option<&RawLine>) -> bool {
    line.is_blank()
}

fn is_title(line: &RawLine, _: Option<&RawLine>) -> bool {
    has_title_key(line.trimmed())
}

fn has_title_key(t: &str) -> bool {
    t.get(..TITLE_KEY.len())
        .is_some_and(|key| key.eq_ignore_ascii_case(TITLE_KEY))
}

fn is_scene_heading(line: &RawLine, _: Option<&RawLine>) -> bool {
    SCENE_RE.is_match(line.trimmed())
}

fn is_keyword_transition(line: &RawLine, _: Option<&RawLine>) -> bool {
    let t = line.trimmed();
    is_upper(t) && TRANSITION_KEYWORDS.iter().any(|kw| t.contains(kw))
}

/// `>TEXT<`
fn is_centered(line: &RawLine, _: Option<&RawLine>) -> bool {
    let t = line.trimmed();
    t.len() > 2 && t.starts_with('>') && t.ends_with('<')
}

fn is_marked_transition(line: &RawLine, _: Option<&RawLine>) -> bool {
    line.trimmed().starts_with('>')
}

fn is_parenthetical(line: &RawLine, _: Option<&RawLine>) -> bool {
    let t = line.trimmed();
    t.starts_with('(') && t.ends_with(')')
}

fn is_indented_character(line: &RawLine, _: Option<&RawLine>) -> bool {
    line.indent >= CHARACTER_INDENT
}

fn is_indented_dialogue(line: &RawLine, _: Option<&RawLine>) -> bool {
    line.indent >= DIALOGUE_INDENT
}

fn is_character_cue(line: &RawLine, next: Option<&RawLine>) -> bool {
    let t = line.trimmed();
    if !is_upper(t) || t.chars().count() >= FOUNTAIN_CHARACTER_MAX_LEN || t.starts_with('(') {
        return false;
    }
    next.is_some_and(|n| {
        let nt = n.trimmed();
        !is_upper(nt) || nt.starts_with('(')
    })
}

/// Classify one Fountain line given the next non-blank line, if any.
pub fn classify_fountain_line(line: &RawLine, next: Option<&RawLine>) -> ClassifiedLine {
    let kind = RULES
        .iter()
        .find(|(_, matches)| matches(line, next))
        .map(|(kind, _)| *kind)
        .unwrap_or(LineKind::Action);

    let t = line.trimmed();
    let content = match kind {
        LineKind::Blank => String::new(),
        LineKind::Title => t[TITLE_KEY.len()..].trim().to_string(),
        LineKind::Transition => strip_transition_marker(t).to_string(),
        LineKind::Centered => t[1..t.len() - 1].trim().to_string(),
        _ => t.to_string(),
    };
    ClassifiedLine::new(kind, content)
}

/// Parse Fountain text back into classified lines.
///
/// Scans with two cursors: the current line and the next non-blank one.
/// The first `Title:` line sets the document title; later ones are kept
/// as lines but do not override it.
pub fn parse(text: &str) -> ScreenplayDocument {
    let lines = split_lines(text);
    let mut classified = Vec::with_capacity(lines.len());
    let mut title: Option<String> = None;
    let mut ahead = 0;

    for (i, line) in lines.iter().enumerate() {
        if ahead <= i {
            ahead = i + 1;
            while ahead < lines.len() && lines[ahead].is_blank() {
                ahead += 1;
            }
        }

        let c = classify_fountain_line(line, lines.get(ahead));
        if c.kind == LineKind::Title && title.is_none() {
            title = Some(c.content.clone());
        }
        classified.push(c);
    }

    ScreenplayDocument::new(classified).with_title(title)
}

// ── Tests ──
