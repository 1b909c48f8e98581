use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::cache::ListingCache;
use crate::config::Settings;
use crate::imsdb::ImsdbClient;
use crate::models::{Episode, Movie, ScriptEntry};
use crate::parser::{self, extract::ExtractStatus, ForwardOptions};
use crate::store;

/// Scrape stats returned after completion.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub too_short: usize,
    pub errors: usize,
    pub skipped: usize,
}

/// What one download task produced.
#[derive(Debug)]
enum Outcome {
    Converted(String),
    Unusable { status: ExtractStatus, chars: usize },
    Failed(String),
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta}) {msg}")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

/// Indices of entries with a script URL that still need downloading.
/// Existing `.fountain` outputs count as skipped unless `force`.
fn pending<T: ScriptEntry>(dir: &Path, entries: &[T], force: bool) -> (Vec<usize>, usize) {
    let mut todo = Vec::new();
    let mut skipped = 0;
    for (i, entry) in entries.iter().enumerate() {
        if entry.script_url().is_none() {
            continue;
        }
        if !force && store::fountain_path(dir, &entry.safe_filename()).exists() {
            skipped += 1;
        } else {
            todo.push(i);
        }
    }
    (todo, skipped)
}

fn convert_page<T: ScriptEntry>(entry: &T, html: &str, min_content_chars: usize) -> Outcome {
    let opts = ForwardOptions {
        title: entry.title_line(),
        min_content_chars,
        format: entry.source_format(),
    };
    let conversion = parser::convert_forward_with(html, &opts);
    if conversion.is_usable() {
        Outcome::Converted(conversion.fountain)
    } else {
        Outcome::Unusable {
            status: conversion.status,
            chars: conversion.content_chars,
        }
    }
}

/// Download and convert every pending script concurrently, writing each
/// `.fountain` file into `dir` as its result arrives. Saved entries get `scraped_at`.
pub async fn scrape_scripts<T: ScriptEntry>(
    settings: &Settings,
    dir: &Path,
    entries: &mut [T],
    force: bool,
) -> Result<ScrapeStats> {
    store::ensure_dir(dir)?;

    let (todo, skipped) = pending(dir, entries, force);
    let total = todo.len();
    info!("{} scripts to download, {} already on disk", total, skipped);

    let client = Arc::new(ImsdbClient::new(settings)?);
    let concurrency = settings.concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let delay = settings.request_delay();
    let min_chars = settings.min_content_chars;
    let pb = progress_bar(total)?;

    // Channel: workers send results, this loop writes files
    let (tx, mut rx) = tokio::sync::mpsc::channel::<(usize, Outcome)>(concurrency * 2);

    for idx in todo {
        let entry = entries[idx].clone();
        let client = Arc::clone(&client);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let Some(url) = entry.script_url().map(str::to_string) else {
                return;
            };
            let outcome = match client.download_script(&url).await {
                Ok(html) => convert_page(&entry, &html, min_chars),
                Err(e) => Outcome::Failed(format!("{:#}", e)),
            };
            let _ = tx.send((idx, outcome)).await;
            tokio::time::sleep(delay).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut stats = ScrapeStats {
        total,
        skipped,
        ..ScrapeStats::default()
    };

    while let Some((idx, outcome)) = rx.recv().await {
        let name = entries[idx].display_name();
        match outcome {
            Outcome::Converted(text) => match store::save_fountain(dir, &entries[idx].safe_filename(), &text) {
                Ok(path) => {
                    stats.ok += 1;
                    entries[idx].mark_scraped(Utc::now());
                    pb.set_message(format!("saved {}", path.display()));
                }
                Err(e) => {
                    stats.errors += 1;
                    warn!("{:#}", e);
                }
            },
            Outcome::Unusable { status, chars } => {
                stats.too_short += 1;
                warn!("No usable script for {} ({:?}, {} chars)", name, status, chars);
            }
            Outcome::Failed(e) => {
                stats.errors += 1;
                warn!("Download failed for {}: {}", name, e);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Scraped {} scripts ({} ok, {} too short, {} errors, {} skipped)",
        stats.total, stats.ok, stats.too_short, stats.errors, stats.skipped
    );
    Ok(stats)
}

pub async fn scrape_screenplays(settings: &Settings, movies: &mut [Movie], force: bool) -> Result<ScrapeStats> {
    scrape_scripts(settings, &settings.output_dir, movies, force).await
}

pub async fn scrape_transcripts(settings: &Settings, episodes: &mut [Episode], force: bool) -> Result<ScrapeStats> {
    scrape_scripts(settings, &settings.transcripts_dir, episodes, force).await
}

/// Fill in missing transcript URLs from each episode's intro page, one
/// page at a time. Returns how many episodes have a transcript URL afterwards.
pub async fn locate_transcripts(settings: &Settings, episodes: &mut [Episode]) -> Result<usize> {
    let client = ImsdbClient::new(settings)?;
    let delay = settings.request_delay();
    let pb = progress_bar(episodes.len())?;

    for episode in episodes.iter_mut() {
        pb.inc(1);
        if episode.transcript_url().is_some() {
            continue;
        }
        let Some(intro) = episode.intro_url().map(str::to_string) else {
            continue;
        };
        pb.set_message(episode.display_name());
        match client.find_transcript_url(&intro).await {
            Ok(Some(url)) => {
                info!("{} -> {}", episode.display_name(), url);
                episode.transcript_url = Some(url);
            }
            Ok(None) => info!("{}: no transcript", episode.display_name()),
            Err(e) => warn!("Lookup failed for {}: {:#}", episode.display_name(), e),
        }
        pause(delay).await;
    }

    pb.finish_and_clear();
    Ok(episodes.iter().filter(|e| e.transcript_url().is_some()).count())
}

/// Resolve an IMSDb script URL for each movie, one title at a time, and
/// return the movies that have one. Lookup errors skip the title.
pub async fn locate_scripts(settings: &Settings, movies: Vec<Movie>) -> Result<Vec<Movie>> {
    let client = ImsdbClient::new(settings)?;
    let mut cache = ListingCache::new();
    let delay = settings.request_delay();
    let pb = progress_bar(movies.len())?;

    let mut found = Vec::new();
    for mut movie in movies {
        if movie.script_url().is_some() {
            found.push(movie);
            pb.inc(1);
            continue;
        }
        pb.set_message(movie.title.clone());
        match client.find_script_url(&movie.title, &mut cache).await {
            Ok(Some(url)) => {
                info!("{} ({}) -> {}", movie.title, movie.year, url);
                movie.imsdb_url = Some(url);
                found.push(movie);
            }
            Ok(None) => info!("{} ({}): no script", movie.title, movie.year),
            Err(e) => warn!("Lookup failed for {}: {:#}", movie.title, e),
        }
        pb.inc(1);
        pause(delay).await;
    }

    pb.finish_and_clear();
    Ok(found)
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

// ── Tests ──
