use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info};

use crate::cache::{ListingCache, ListingEntry};
use crate::config::Settings;
use crate::http::{self, Backoff};
use crate::models::Episode;

static PRE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<pre[^>]*>(.*?)</pre>").unwrap());
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).unwrap()
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
/// Season headers and anchors of a TV show page, in document order.
static SHOW_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<h2[^>]*>(.*?)</h2>|<a\s[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).unwrap()
});
static SEASON_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Series\s*(\d+)").unwrap());

/// Lookups scoring below this are not trusted.
pub const MIN_MATCH_SCORE: u32 = 60;
/// A script page must carry at least this much `<pre>` text.
const MIN_PRE_CHARS: usize = 100;
/// Title words are looked for in this many leading chars of the script.
const TITLE_CHECK_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// All anchors in a page, with tags stripped and entities decoded in the text.
pub fn parse_links(html: &str) -> Vec<Link> {
    ANCHOR_RE
        .captures_iter(html)
        .map(|caps| {
            let text = TAG_RE.replace_all(&caps[2], "");
            Link {
                href: html_escape::decode_html_entities(&caps[1]).trim().to_string(),
                text: html_escape::decode_html_entities(&text).trim().to_string(),
            }
        })
        .collect()
}

/// Movie intro-page links in a search result page.
pub fn parse_search_results(html: &str) -> Vec<Link> {
    parse_links(html)
        .into_iter()
        .filter(|l| l.href.to_lowercase().contains("/movie/") || l.href.contains("/Movie Scripts/"))
        .collect()
}

/// Entries of the `all-scripts.html` listing.
pub fn parse_listing(html: &str) -> Vec<ListingEntry> {
    parse_links(html)
        .into_iter()
        .filter(|l| l.href.contains("/Movie Scripts/") && !l.text.is_empty())
        .map(|l| ListingEntry {
            title: l.text,
            href: l.href,
        })
        .collect()
}

/// First script link inside the `.script-details` block of an intro page.
pub fn parse_script_link(html: &str) -> Option<String> {
    let start = html.find("script-details")?;
    parse_links(&html[start..])
        .into_iter()
        .map(|l| l.href)
        .find(|href| href.starts_with("/scripts") || href.starts_with("/transcripts"))
}

fn is_episode_intro(href: &str) -> bool {
    (href.contains("/TV Transcripts/") || href.contains("/TV%20Transcripts/")) && href.ends_with(".html")
}

/// Episodes listed on a TV show page. An `<h2>` naming `Series N` opens
/// season N and restarts numbering; links before any header are season 1.
pub fn parse_episode_list(html: &str, base: &str) -> Vec<Episode> {
    let mut season = 1;
    let mut episode_num = 0;
    let mut episodes = Vec::new();

    for caps in SHOW_ITEM_RE.captures_iter(html) {
        if let Some(header) = caps.get(1) {
            if let Some(n) = SEASON_RE.captures(header.as_str()).and_then(|c| c[1].parse::<u32>().ok()) {
                season = n;
                episode_num = 0;
            }
            continue;
        }
        let href = html_escape::decode_html_entities(&caps[2]).trim().to_string();
        if !is_episode_intro(&href) {
            continue;
        }
        let text = TAG_RE.replace_all(&caps[3], "");
        let title = html_escape::decode_html_entities(&text).replace(" Script", "").trim().to_string();

        episode_num += 1;
        let mut episode = Episode::new(title, season, episode_num);
        episode.imsdb_url = Some(absolute_url(base, &href));
        episodes.push(episode);
    }
    episodes
}

/// Transcript URL for an episode intro page: its details-block link, else
/// the intro page itself when it already carries the `<pre>` text.
pub fn transcript_link(intro_html: &str, intro_url: &str, base: &str) -> Option<String> {
    if let Some(href) = parse_script_link(intro_html) {
        return Some(absolute_url(base, &href));
    }
    intro_html.to_lowercase().contains("<pre").then(|| intro_url.to_string())
}

/// How well a link text names `title`: 100 exact, 80 containment,
/// 60 every significant word present, 0 otherwise.
pub fn match_score(title: &str, candidate: &str) -> u32 {
    let title = title.trim().to_lowercase();
    let title = title.strip_prefix("the ").unwrap_or(&title).trim();
    let text = candidate.to_lowercase().replace(" script", "");
    let text = text.trim();

    if text.is_empty() || title.is_empty() {
        0
    } else if title == text {
        100
    } else if text.contains(title) || title.contains(text) {
        80
    } else if title.split_whitespace().filter(|w| w.len() > 2).all(|w| text.contains(w)) {
        60
    } else {
        0
    }
}

/// Best-scoring candidate at or above `MIN_MATCH_SCORE`. Ties keep the first.
pub fn best_match<'a, I>(title: &str, candidates: I) -> Option<(&'a str, u32)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut best: Option<(&str, u32)> = None;
    for (text, href) in candidates {
        let score = match_score(title, text);
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((href, score));
        }
    }
    best.filter(|(_, score)| *score >= MIN_MATCH_SCORE)
}

/// Does this page hold a real script for `title`?
pub fn verify_script_page(html: &str, title: &str) -> bool {
    let Some(caps) = PRE_BLOCK_RE.captures(html) else {
        return false;
    };
    let pre = &caps[1];
    if pre.trim().len() < MIN_PRE_CHARS {
        return false;
    }

    let words: Vec<String> = title.split_whitespace().map(str::to_lowercase).collect();
    if words.is_empty() {
        return true;
    }
    let head: String = pre.chars().take(TITLE_CHECK_CHARS).collect::<String>().to_lowercase();
    let found = words.iter().filter(|w| head.contains(w.as_str())).count();
    found * 2 >= words.len()
}

pub fn direct_script_url(base: &str, title: &str) -> String {
    format!("{}/scripts/{}.html", base, title.trim().replace(' ', "-"))
}

pub fn absolute_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/{}", base, href)
    }
}

pub struct ImsdbClient {
    http: Client,
    base_url: String,
    backoff: Backoff,
}

impl ImsdbClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(ImsdbClient {
            http: http::build_client(settings)?,
            base_url: settings.imsdb_base_url.trim_end_matches('/').to_string(),
            backoff: Backoff::from_settings(settings),
        })
    }

    pub async fn download_script(&self, url: &str) -> Result<String> {
        http::get_text(&self.http, self.backoff, url)
            .await?
            .with_context(|| format!("Script page unavailable: {}", url))
    }

    pub async fn fetch_episode_list(&self, show_url: &str) -> Result<Vec<Episode>> {
        let html = http::get_text(&self.http, self.backoff, show_url)
            .await?
            .with_context(|| format!("Show page unavailable: {}", show_url))?;
        let episodes = parse_episode_list(&html, &self.base_url);
        info!("{} episodes on {}", episodes.len(), show_url);
        Ok(episodes)
    }

    pub async fn find_transcript_url(&self, intro_url: &str) -> Result<Option<String>> {
        let Some(html) = http::get_text(&self.http, self.backoff, intro_url).await? else {
            return Ok(None);
        };
        Ok(transcript_link(&html, intro_url, &self.base_url))
    }

    /// Direct URL guess, then site search, then the cached full listing.
    pub async fn find_script_url(&self, title: &str, cache: &mut ListingCache) -> Result<Option<String>> {
        if let Some(url) = self.guess_script_url(title).await? {
            return Ok(Some(url));
        }
        if let Some(url) = self.search(title).await? {
            return Ok(Some(url));
        }
        self.search_listing(title, cache).await
    }

    pub async fn guess_script_url(&self, title: &str) -> Result<Option<String>> {
        let url = direct_script_url(&self.base_url, title);
        let found = match http::get_text(&self.http, self.backoff, &url).await? {
            Some(html) => verify_script_page(&html, title),
            None => false,
        };
        debug!("direct guess {} -> {}", url, found);
        Ok(found.then_some(url))
    }

    pub async fn search(&self, title: &str) -> Result<Option<String>> {
        let url = format!("{}/search.php", self.base_url);
        let query = title.trim();
        let resp = http::send_with_retry(&url, self.backoff, || {
            self.http
                .post(&url)
                .form(&[("search_query", query), ("submit", "Go!")])
        })
        .await?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        let html = resp.text().await.context("Failed to read search results")?;

        let links = parse_search_results(&html);
        let Some((href, score)) = best_match(title, links.iter().map(|l| (l.text.as_str(), l.href.as_str()))) else {
            return Ok(None);
        };
        info!("search match for {:?}: {} (score {})", title, href, score);
        self.script_from_intro(&absolute_url(&self.base_url, href)).await
    }

    async fn search_listing(&self, title: &str, cache: &mut ListingCache) -> Result<Option<String>> {
        let listing_url = format!("{}/all-scripts.html", self.base_url);
        let (client, backoff, url) = (&self.http, self.backoff, listing_url.as_str());
        let entries = cache
            .get_or_fetch(move || async move {
                let html = http::get_text(client, backoff, url)
                    .await?
                    .context("All-scripts listing unavailable")?;
                Ok(parse_listing(&html))
            })
            .await?;

        let Some((href, score)) = best_match(title, entries.iter().map(|e| (e.title.as_str(), e.href.as_str()))) else {
            return Ok(None);
        };
        info!("listing match for {:?}: {} (score {})", title, href, score);
        let intro = absolute_url(&self.base_url, href);
        self.script_from_intro(&intro).await
    }

    async fn script_from_intro(&self, intro_url: &str) -> Result<Option<String>> {
        let Some(html) = http::get_text(&self.http, self.backoff, intro_url).await? else {
            return Ok(None);
        };
        Ok(parse_script_link(&html).map(|href| absolute_url(&self.base_url, &href)))
    }
}

// ── Tests ──
