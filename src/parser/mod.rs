pub mod classify;
pub mod extract;
pub mod fountain;
pub mod layout;
pub mod lines;
pub mod transcript;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConvertError;
use extract::ExtractStatus;
use layout::LayoutDocument;
use lines::{LineKind, ScreenplayDocument};

/// Bodies with fewer non-whitespace characters than this are not usable.
pub const MIN_CONTENT_CHARS: usize = 50;

/// Which page layout the `<pre>` body follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Feature screenplays laid out by column.
    #[default]
    Screenplay,
    /// TV transcripts with shallow cues and inline `NAME: text` speech.
    Transcript,
}

impl SourceFormat {
    pub fn header_window(self) -> usize {
        match self {
            SourceFormat::Screenplay => extract::HEADER_SCAN_LINES,
            SourceFormat::Transcript => extract::TRANSCRIPT_HEADER_LINES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForwardOptions {
    pub title: Option<String>,
    pub min_content_chars: usize,
    pub format: SourceFormat,
}

impl Default for ForwardOptions {
    fn default() -> Self {
        ForwardOptions {
            title: None,
            min_content_chars: MIN_CONTENT_CHARS,
            format: SourceFormat::Screenplay,
        }
    }
}

/// Result of the forward pipeline. Never an error: `status` says whether
/// `fountain` is worth keeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub fountain: String,
    pub status: ExtractStatus,
    pub content_chars: usize,
}

impl Conversion {
    pub fn is_usable(&self) -> bool {
        self.status == ExtractStatus::Found
    }

    pub fn into_result(self) -> Result<String, ConvertError> {
        match self.status {
            ExtractStatus::Found => Ok(self.fountain),
            ExtractStatus::NoContentFound => Err(ConvertError::NoContentFound),
            ExtractStatus::EmptyOrTooShort => Err(ConvertError::EmptyOrTooShort {
                chars: self.content_chars,
            }),
        }
    }
}

/// HTML page → Fountain text.
pub fn convert_forward(html: &str) -> Conversion {
    convert_forward_with(html, &ForwardOptions::default())
}

/// Transcript page → Fountain text.
pub fn convert_transcript(html: &str) -> Conversion {
    let opts = ForwardOptions {
        format: SourceFormat::Transcript,
        ..ForwardOptions::default()
    };
    convert_forward_with(html, &opts)
}

/// Extractor → forward classifier → Fountain emitter.
pub fn convert_forward_with(html: &str, opts: &ForwardOptions) -> Conversion {
    let extraction = extract::extract_body_with(html, opts.format.header_window());
    if extraction.status == ExtractStatus::NoContentFound {
        return Conversion {
            fountain: String::new(),
            status: ExtractStatus::NoContentFound,
            content_chars: 0,
        };
    }

    let doc = match opts.format {
        SourceFormat::Screenplay => classify::classify_document(&extraction.body),
        SourceFormat::Transcript => transcript::classify_transcript(&extraction.body),
    }
    .with_title(opts.title.clone());
    let content_chars = count_content_chars(&doc);
    debug!(
        lines = doc.lines.len(),
        scenes = doc.count(LineKind::SceneHeading),
        cues = doc.count(LineKind::Character),
        content_chars,
        "classified screenplay body"
    );

    let status = if content_chars < opts.min_content_chars {
        ExtractStatus::EmptyOrTooShort
    } else {
        ExtractStatus::Found
    };

    let mut text = fountain::emit(&doc);
    if opts.format == SourceFormat::Transcript {
        text = text.trim().to_string();
    }

    Conversion {
        fountain: text,
        status,
        content_chars,
    }
}

/// Fountain text → layout document for rendering.
pub fn convert_reverse(fountain_text: &str, title_hint: Option<&str>) -> LayoutDocument {
    let doc = fountain::parse(fountain_text);
    debug!(lines = doc.lines.len(), title = ?doc.title, "parsed fountain");
    layout::layout(doc, title_hint)
}

fn count_content_chars(doc: &ScreenplayDocument) -> usize {
    doc.lines
        .iter()
        .flat_map(|l| l.content.chars())
        .filter(|c| !c.is_whitespace())
        .count()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(body: &str) -> String {
        format!("<html><body><pre>{}</pre></body></html>", body)
    }

    #[test]
    fn no_pre_is_empty_not_error() {
        let html = std::fs::read_to_string("tests/fixtures/no_script.html").unwrap();
        let c = convert_forward(&html);
        assert_eq!(c.status, ExtractStatus::NoContentFound);
        assert!(c.fountain.is_empty());
        assert!(!c.is_usable());
        assert_eq!(c.into_result(), Err(ConvertError::NoContentFound));
    }

    #[test]
    fn forty_chars_is_too_short() {
        let body = format!("\n{}\n", "x".repeat(40));
        let c = convert_forward(&wrap(&body));
        assert_eq!(c.status, ExtractStatus::EmptyOrTooShort);
        assert_eq!(c.content_chars, 40);
        assert_eq!(c.into_result(), Err(ConvertError::EmptyOrTooShort { chars: 40 }));
    }

    #[test]
    fn title_header_and_markers_do_not_count() {
        let body = format!("\n{}\nCUT TO:\n", "x".repeat(40));
        let opts = ForwardOptions {
            title: Some("The Maltese Falcon".into()),
            ..Default::default()
        };
        let c = convert_forward_with(&wrap(&body), &opts);
        assert!(c.fountain.starts_with("Title: The Maltese Falcon\n\n"));
        assert!(c.fountain.contains("\n> CUT TO:"));
        assert!(c.fountain.chars().filter(|ch| !ch.is_whitespace()).count() >= MIN_CONTENT_CHARS);
        assert_eq!(c.content_chars, 46);
        assert_eq!(c.status, ExtractStatus::EmptyOrTooShort);
    }

    #[test]
    fn threshold_is_configurable() {
        let body = format!("\n{}\n", "x".repeat(40));
        let opts = ForwardOptions {
            min_content_chars: 10,
            ..Default::default()
        };
        assert!(convert_forward_with(&wrap(&body), &opts).is_usable());
    }

    #[test]
    fn fixture_forward() {
        let html = std::fs::read_to_string("tests/fixtures/casablanca.html").unwrap();
        let c = convert_forward(&html);
        assert!(c.is_usable());
        let text = c.fountain;
        assert!(text.contains("\nINT. RICK'S CAFE - NIGHT\n"));
        assert!(text.contains("\n> FADE IN:\n"));
        assert!(text.contains("\n> CUT TO:\n"));
        assert!(text.contains("I don't know what you mean, Miss Ilsa.\n\n> CUT TO:"));
        assert!(text.contains("Julius J. Epstein & Philip G. Epstein"));
        assert!(!text.contains("<"));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn transcript_fixture_forward() {
        let html = std::fs::read_to_string("tests/fixtures/south_park.html").unwrap();
        let c = convert_transcript(&html);
        assert!(c.is_usable());
        let text = c.fountain;
        assert!(text.starts_with("SOUTH PARK\n"));
        assert!(text.ends_with("waits at the board."));
        assert!(text.contains("\n> FADE IN:\n"));
        assert!(text.contains("\nEXT. BUS STOP - MORNING\n\nSTAN\nDude, we have to do something.\n"));
        assert!(text.contains(
            "\nKYLE\nWhat are we supposed to do?\nCARTMAN\nScrew you guys, I'm going home.\n\n> CUT TO:\n"
        ));
    }

    #[test]
    fn transcript_without_pre_is_empty() {
        let html = std::fs::read_to_string("tests/fixtures/no_script.html").unwrap();
        let c = convert_transcript(&html);
        assert_eq!(c.status, ExtractStatus::NoContentFound);
        assert!(c.fountain.is_empty());
    }

    #[test]
    fn screenplay_rules_do_not_split_colons() {
        let html = wrap("\nKYLE: What are we supposed to do? We need a real plan here.\n");
        let c = convert_forward(&html);
        assert_eq!(c.fountain.lines().filter(|l| !l.is_empty()).count(), 1);
        let t = convert_transcript(&html);
        assert_eq!(t.fountain, "KYLE\nWhat are we supposed to do? We need a real plan here.");
    }

    #[test]
    fn titled_forward_round_trips_title() {
        let html = std::fs::read_to_string("tests/fixtures/casablanca.html").unwrap();
        let opts = ForwardOptions {
            title: Some("Casablanca".into()),
            ..Default::default()
        };
        let text = convert_forward_with(&html, &opts).into_result().unwrap();
        assert!(text.starts_with("Title: Casablanca\n\n"));
        let out = convert_reverse(&text, Some("ignored"));
        assert_eq!(out.title.as_deref(), Some("Casablanca"));
    }

    #[test]
    fn reverse_of_forward_keeps_roles() {
        let html = std::fs::read_to_string("tests/fixtures/casablanca.html").unwrap();
        let text = convert_forward(&html).fountain;
        let out = convert_reverse(&text, None);
        let texts = |class: layout::FragmentClass| {
            out.fragments
                .iter()
                .filter(|f| f.class == class)
                .map(|f| f.text.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(
            texts(layout::FragmentClass::SceneHeading),
            vec!["INT. RICK'S CAFE - NIGHT", "EXT. AIRPORT - NIGHT"]
        );
        assert_eq!(texts(layout::FragmentClass::Transition), vec!["FADE IN:", "CUT TO:"]);
        assert!(texts(layout::FragmentClass::Character).contains(&"RICK"));
        assert_eq!(texts(layout::FragmentClass::Parenthetical), vec!["(beat)"]);
    }
}
