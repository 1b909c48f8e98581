use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static OPEN_PRE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<pre(?:\s[^>]*)?>").unwrap());
static PRE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</?pre[^>]*>").unwrap());
static BOLD_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</?b>").unwrap());
static ANY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Only this many leading lines are searched for the first content line.
pub const HEADER_SCAN_LINES: usize = 30;
/// Transcript pages carry a shorter header.
pub const TRANSCRIPT_HEADER_LINES: usize = 20;

const BOILERPLATE_PREFIXES: &[&str] = &["<", "//", "if "];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStatus {
    Found,
    NoContentFound,
    EmptyOrTooShort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub body: String,
    pub status: ExtractStatus,
}

impl Extraction {
    fn not_found() -> Self {
        Extraction {
            body: String::new(),
            status: ExtractStatus::NoContentFound,
        }
    }
}

/// Isolate the `<pre>` screenplay body of an HTML page and strip markup.
///
/// The span runs from the first opening `<pre>` (or `<pre ...>`) to the last
/// `</pre>`. A missing closing tag keeps everything after the opening tag.
/// Never fails: a page without `<pre>` yields an empty `NoContentFound` result.
pub fn extract_body(html: &str) -> Extraction {
    extract_body_with(html, HEADER_SCAN_LINES)
}

/// `extract_body` with the header search limited to `header_window` lines.
pub fn extract_body_with(html: &str, header_window: usize) -> Extraction {
    let Some(span) = pre_span(html) else {
        debug!("no <pre> block in document ({} bytes)", html.len());
        return Extraction::not_found();
    };

    let cleaned = strip_markup(span);
    let lines: Vec<&str> = cleaned.split('\n').collect();
    let start = header_skip_index(&lines, header_window);
    debug!(start, total = lines.len(), "header skip");

    Extraction {
        body: lines[start..].join("\n"),
        status: ExtractStatus::Found,
    }
}

fn pre_span(html: &str) -> Option<&str> {
    let open = OPEN_PRE_RE.find(html)?;
    // ASCII lowering keeps byte offsets aligned with the original.
    let lower = html.to_ascii_lowercase();
    let end = match lower.rfind("</pre>") {
        Some(end) if end > open.start() => end,
        _ => html.len(),
    };
    Some(&html[open.start()..end])
}

/// Tag and entity cleanup, in order: pre tags, bold tags, entities, any tag.
pub fn strip_markup(text: &str) -> String {
    let text = PRE_TAG_RE.replace_all(text, "");
    let text = BOLD_TAG_RE.replace_all(&text, "");
    let text = html_escape::decode_html_entities(&text);
    ANY_TAG_RE.replace_all(&text, "").into_owned()
}

/// Index to start the body at: one line before the first line that is
/// neither empty nor boilerplate, if that line is within the scan window.
pub fn header_skip_index(lines: &[&str], window: usize) -> usize {
    lines
        .iter()
        .take(window)
        .position(|line| {
            let t = line.trim();
            !t.is_empty() && !BOILERPLATE_PREFIXES.iter().any(|p| t.starts_with(p))
        })
        .map(|i| i.saturating_sub(1))
        .unwrap_or(0)
}

// ── Tests ──
