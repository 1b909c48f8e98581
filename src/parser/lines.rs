use std::fmt;

/// One physical line of input with its indentation measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine<'a> {
    pub text: &'a str,
    pub indent: usize,
}

impl<'a> RawLine<'a> {
    pub fn new(text: &'a str) -> Self {
        let indent = text.chars().take_while(|c| c.is_whitespace()).count();
        RawLine { text, indent }
    }

    pub fn trimmed(&self) -> &'a str {
        self.text.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }
}

/// Split text into raw lines. `\r\n` endings are normalized by `str::lines`.
pub fn split_lines(text: &str) -> Vec<RawLine<'_>> {
    text.lines().map(RawLine::new).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    SceneHeading,
    Transition,
    Character,
    Dialogue,
    Parenthetical,
    Action,
    Blank,
    Title,
    Centered,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::SceneHeading => "scene_heading",
            LineKind::Transition => "transition",
            LineKind::Character => "character",
            LineKind::Dialogue => "dialogue",
            LineKind::Parenthetical => "parenthetical",
            LineKind::Action => "action",
            LineKind::Blank => "blank",
            LineKind::Title => "title",
            LineKind::Centered => "centered",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line after classification. `content` is trimmed and has markers
/// (`>` transition prefix, `Title:` key, numeric scene prefix) removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub kind: LineKind,
    pub content: String,
}

impl ClassifiedLine {
    pub fn new(kind: LineKind, content: impl Into<String>) -> Self {
        ClassifiedLine {
            kind,
            content: content.into(),
        }
    }

    pub fn blank() -> Self {
        ClassifiedLine::new(LineKind::Blank, "")
    }
}

/// Classified lines in reading order plus an optional title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenplayDocument {
    pub title: Option<String>,
    pub lines: Vec<ClassifiedLine>,
}

impl ScreenplayDocument {
    pub fn new(lines: Vec<ClassifiedLine>) -> Self {
        ScreenplayDocument { title: None, lines }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }
}

/// Python-style `isupper`: at least one cased char and no lower-case ones.
pub fn is_upper(s: &str) -> bool {
    let mut cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Strip a leading `>` transition marker, if any.
pub fn strip_transition_marker(s: &str) -> &str {
    match s.strip_prefix('>') {
        Some(rest) => rest.trim_start(),
        None => s,
    }
}

// ── Tests ──
