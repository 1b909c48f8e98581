use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::parser::MIN_CONTENT_CHARS;
use crate::store::{EPISODE_LIST_FILE, MOVIE_LIST_FILE};

const CONFIG_FILE: &str = "screenplay_scraper";
const ENV_PREFIX: &str = "SCREENPLAY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub imsdb_base_url: String,
    pub imdb_top250_url: String,
    /// IMSDb TV show page listing every episode transcript.
    pub imsdb_show_url: String,
    pub output_dir: PathBuf,
    pub transcripts_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub delay_between_requests_ms: u64,
    pub concurrency: usize,
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub proxy: Option<String>,
    pub user_agent: String,
    pub min_content_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            imsdb_base_url: "https://imsdb.com".to_string(),
            imdb_top250_url: "https://www.imdb.com/chart/top/".to_string(),
            imsdb_show_url: "https://imsdb.com/TV/South%20Park.html".to_string(),
            output_dir: PathBuf::from("screenplays"),
            transcripts_dir: PathBuf::from("transcripts"),
            request_timeout_secs: 30,
            delay_between_requests_ms: 2000,
            concurrency: 4,
            max_retries: 3,
            base_backoff_ms: 2000,
            proxy: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            min_content_chars: MIN_CONTENT_CHARS,
        }
    }
}

impl Settings {
    /// Defaults, then `screenplay_scraper.toml` if present, then `SCREENPLAY_*` env vars.
    pub fn load() -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX));
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        builder
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests_ms)
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn movie_list_path(&self) -> PathBuf {
        self.output_dir.join(MOVIE_LIST_FILE)
    }

    pub fn episode_list_path(&self) -> PathBuf {
        self.transcripts_dir.join(EPISODE_LIST_FILE)
    }
}

// ── Tests ──
