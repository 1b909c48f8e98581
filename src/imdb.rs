use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Settings;
use crate::http::{self, Backoff};
use crate::models::Movie;

static LD_JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#).unwrap()
});
static TITLE_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/title/(tt\d+)").unwrap());

#[derive(Deserialize)]
struct ItemList {
    #[serde(rename = "@type")]
    kind: String,
    #[serde(rename = "itemListElement", default)]
    items: Vec<ListItem>,
}

#[derive(Deserialize)]
struct ListItem {
    #[serde(default)]
    item: Option<ChartMovie>,
}

#[derive(Deserialize)]
struct ChartMovie {
    #[serde(default)]
    url: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "datePublished", default)]
    date_published: Option<String>,
}

/// Movies on a Top 250 chart page, in chart order. Reads the JSON-LD
/// `ItemList` and falls back to scanning `/title/tt...` links.
pub fn parse_top250(html: &str) -> Vec<Movie> {
    let movies = parse_json_ld(html);
    if !movies.is_empty() {
        return movies;
    }
    warn!("no JSON-LD chart found, falling back to title links");
    parse_title_links(html)
}

fn parse_json_ld(html: &str) -> Vec<Movie> {
    for caps in LD_JSON_RE.captures_iter(html) {
        let Ok(list) = serde_json::from_str::<ItemList>(caps[1].trim()) else {
            continue;
        };
        if list.kind != "ItemList" {
            continue;
        }
        return list
            .items
            .into_iter()
            .filter_map(|li| li.item)
            .filter_map(|m| {
                let id = TITLE_ID_RE.captures(&m.url)?[1].to_string();
                let year = m
                    .date_published
                    .as_deref()
                    .and_then(|d| d.get(..4))
                    .and_then(|y| y.parse().ok())
                    .unwrap_or(0);
                let title = html_escape::decode_html_entities(&m.name).into_owned();
                Some(Movie::new(title, year, id))
            })
            .collect();
    }
    Vec::new()
}

fn parse_title_links(html: &str) -> Vec<Movie> {
    let mut seen = HashSet::new();
    TITLE_ID_RE
        .captures_iter(html)
        .map(|caps| caps[1].to_string())
        .filter(|id| seen.insert(id.clone()))
        .map(|id| Movie::new("", 0, id))
        .collect()
}

pub async fn fetch_top250(settings: &Settings) -> Result<Vec<Movie>> {
    let client = http::build_client(settings)?;
    let url = &settings.imdb_top250_url;
    let resp = http::send_with_retry(url, Backoff::from_settings(settings), || {
        client.get(url).header("Accept-Language", "en-US,en;q=0.9")
    })
    .await?
    .error_for_status()
    .context("IMDb chart request failed")?;
    let html = resp.text().await.context("Failed to read IMDb chart")?;

    let movies = parse_top250(&html);
    info!("Parsed {} movies from IMDb chart", movies.len());
    Ok(movies)
}

// ── Tests ──
