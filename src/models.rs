use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parser::SourceFormat;

static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Something the download pipeline can fetch and save as one `.fountain` file.
pub trait ScriptEntry: Clone + Send + 'static {
    /// Human-readable name for progress and log lines.
    fn display_name(&self) -> String;
    fn script_url(&self) -> Option<&str>;
    /// Output file stem, without extension.
    fn safe_filename(&self) -> String;
    fn source_format(&self) -> SourceFormat;
    /// `Title:` line to put at the top of the output, if any.
    fn title_line(&self) -> Option<String>;
    fn mark_scraped(&mut self, at: DateTime<Utc>);
}

fn non_empty(url: &Option<String>) -> Option<&str> {
    url.as_deref().filter(|u| !u.trim().is_empty())
}

/// A movie from the IMDb chart, optionally matched to an IMSDb script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    #[serde(default)]
    pub year: u32,
    pub imdb_id: String,
    #[serde(default)]
    pub imdb_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imsdb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
}

impl Movie {
    pub fn new(title: impl Into<String>, year: u32, imdb_id: impl Into<String>) -> Self {
        let imdb_id = imdb_id.into();
        Movie {
            title: title.into(),
            year,
            imdb_url: format!("https://www.imdb.com/title/{}/", imdb_id),
            imdb_id,
            imsdb_url: None,
            scraped_at: None,
        }
    }

    /// Older lists store a missing script as `""`.
    pub fn script_url(&self) -> Option<&str> {
        non_empty(&self.imsdb_url)
    }

    pub fn safe_filename(&self) -> String {
        format!("{} ({})", self.title, self.year).replace(['/', ':'], "-")
    }
}

impl ScriptEntry for Movie {
    fn display_name(&self) -> String {
        format!("{} ({})", self.title, self.year)
    }

    fn script_url(&self) -> Option<&str> {
        Movie::script_url(self)
    }

    fn safe_filename(&self) -> String {
        Movie::safe_filename(self)
    }

    fn source_format(&self) -> SourceFormat {
        SourceFormat::Screenplay
    }

    fn title_line(&self) -> Option<String> {
        Some(self.title.clone())
    }

    fn mark_scraped(&mut self, at: DateTime<Utc>) {
        self.scraped_at = Some(at);
    }
}

/// One TV episode listed on an IMSDb show page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub title: String,
    pub season: u32,
    /// Position within the season, from 1.
    pub episode_num: u32,
    /// Episode intro page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imsdb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
}

impl Episode {
    pub fn new(title: impl Into<String>, season: u32, episode_num: u32) -> Self {
        Episode {
            title: title.into(),
            season,
            episode_num,
            imsdb_url: None,
            transcript_url: None,
            scraped_at: None,
        }
    }

    pub fn code(&self) -> String {
        format!("S{:02}E{:02}", self.season, self.episode_num)
    }

    pub fn intro_url(&self) -> Option<&str> {
        non_empty(&self.imsdb_url)
    }

    pub fn transcript_url(&self) -> Option<&str> {
        non_empty(&self.transcript_url)
    }

    /// `S01E02_Weight_Gain_4000`: punctuation dropped, whitespace runs joined by `_`.
    pub fn safe_filename(&self) -> String {
        let clean = NON_WORD_RE.replace_all(&self.title, "");
        let clean = SPACE_RUN_RE.replace_all(clean.trim(), "_");
        format!("{}_{}", self.code(), clean)
    }
}

impl ScriptEntry for Episode {
    fn display_name(&self) -> String {
        format!("{} - {}", self.code(), self.title)
    }

    fn script_url(&self) -> Option<&str> {
        self.transcript_url()
    }

    fn safe_filename(&self) -> String {
        Episode::safe_filename(self)
    }

    fn source_format(&self) -> SourceFormat {
        SourceFormat::Transcript
    }

    /// Transcripts carry no title line; renderers take it from the file stem.
    fn title_line(&self) -> Option<String> {
        None
    }

    fn mark_scraped(&mut self, at: DateTime<Utc>) {
        self.scraped_at = Some(at);
    }
}

// ── Tests ──
