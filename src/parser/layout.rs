use std::sync::LazyLock;

use regex::Regex;

use super::lines::{LineKind, ScreenplayDocument};

static EPISODE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^S\d+E\d+_").unwrap());

/// Print stylesheet for screenplay pages (letter, Courier 12pt).
pub const SCREENPLAY_CSS: &str = r#"
@page { size: letter; margin: 1in; }
body { font-family: Courier, monospace; font-size: 12pt; line-height: 1.0; margin: 0; padding: 0; }
.title-header { text-align: center; margin-bottom: 1in; }
.title-header h1 { font-size: 24pt; font-weight: bold; margin: 0; text-transform: uppercase; }
.scene-heading { font-weight: bold; text-transform: uppercase; margin-top: 1em; margin-bottom: 0.5em; }
.action { margin-bottom: 0.5em; }
.character { margin-left: 2in; margin-top: 0.5em; font-weight: bold; }
.dialogue { margin-left: 1.5in; margin-right: 2in; margin-bottom: 0.5em; }
.parenthetical { margin-left: 1.75in; margin-right: 2in; }
.transition { text-align: right; text-transform: uppercase; margin-top: 0.5em; margin-bottom: 0.5em; }
.centered { text-align: center; }
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentClass {
    SceneHeading,
    Action,
    Character,
    Dialogue,
    Parenthetical,
    Transition,
    Centered,
}

impl FragmentClass {
    /// Kinds without a fragment (blank lines, titles) map to `None`.
    pub fn for_kind(kind: LineKind) -> Option<Self> {
        match kind {
            LineKind::SceneHeading => Some(FragmentClass::SceneHeading),
            LineKind::Action => Some(FragmentClass::Action),
            LineKind::Character => Some(FragmentClass::Character),
            LineKind::Dialogue => Some(FragmentClass::Dialogue),
            LineKind::Parenthetical => Some(FragmentClass::Parenthetical),
            LineKind::Transition => Some(FragmentClass::Transition),
            LineKind::Centered => Some(FragmentClass::Centered),
            LineKind::Blank | LineKind::Title => None,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            FragmentClass::SceneHeading => "scene-heading",
            FragmentClass::Action => "action",
            FragmentClass::Character => "character",
            FragmentClass::Dialogue => "dialogue",
            FragmentClass::Parenthetical => "parenthetical",
            FragmentClass::Transition => "transition",
            FragmentClass::Centered => "centered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutFragment {
    pub class: FragmentClass,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutDocument {
    pub title: Option<String>,
    pub fragments: Vec<LayoutFragment>,
}

/// Map parsed lines to layout fragments. The document's own `Title:` wins
/// over `title_hint`.
pub fn layout(doc: ScreenplayDocument, title_hint: Option<&str>) -> LayoutDocument {
    let title = doc.title.or_else(|| {
        title_hint
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    });

    let fragments = doc
        .lines
        .into_iter()
        .filter_map(|line| {
            FragmentClass::for_kind(line.kind).map(|class| LayoutFragment {
                class,
                text: line.content,
            })
        })
        .collect();

    LayoutDocument { title, fragments }
}

impl LayoutDocument {
    /// Standalone HTML page with the screenplay stylesheet embedded.
    pub fn to_html(&self) -> String {
        let mut parts = Vec::with_capacity(self.fragments.len() + 4);
        parts.push(format!(
            "<html><head><meta charset=\"utf-8\"><style>{}</style></head><body>",
            SCREENPLAY_CSS
        ));

        if let Some(title) = &self.title {
            parts.push(format!(
                "<div class=\"title-header\"><h1>{}</h1></div>",
                html_escape::encode_text(title)
            ));
        }

        for fragment in &self.fragments {
            parts.push(format!(
                "<div class=\"{}\">{}</div>",
                fragment.class.css_class(),
                html_escape::encode_text(&fragment.text)
            ));
        }

        parts.push("</body></html>".to_string());
        parts.join("\n")
    }
}

/// Title hint from a file stem: `S01E05_Weight_Gain_4000` → `Weight Gain 4000`.
pub fn title_from_stem(stem: &str) -> String {
    EPISODE_CODE_RE.replace(stem, "").replace('_', " ").trim().to_string()
}

// ── Tests ──
