use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use screenplay_scraper::cache::ListingCache;
use screenplay_scraper::config::Settings;
use screenplay_scraper::imsdb::ImsdbClient;
use screenplay_scraper::models::{Episode, Movie};
use screenplay_scraper::parser::{self, ForwardOptions, SourceFormat};
use screenplay_scraper::{imdb, render, scraper, store};

#[derive(Parser)]
#[command(name = "screenplay_scraper", about = "IMSDb screenplay scraper and Fountain converter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the IMDb Top 250 and locate each script on IMSDb
    List {
        /// Only look up the first N movies
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Download and convert every script in the movie list
    Scrape {
        /// Max scripts to download (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Overwrite existing .fountain files
        #[arg(short, long)]
        force: bool,
    },
    /// Convert a saved script page to Fountain
    Convert {
        input: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Title line to put at the top
        #[arg(short, long)]
        title: Option<String>,
        /// Treat the page as a TV transcript
        #[arg(long)]
        transcript: bool,
    },
    /// Fetch a TV show's episode list and locate each transcript
    Episodes {
        /// Show page (default: settings.imsdb_show_url)
        #[arg(long)]
        url: Option<String>,
        /// Only look up the first N episodes
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Download and convert every transcript in the episode list
    Transcripts {
        /// Max transcripts to download (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Overwrite existing .fountain files
        #[arg(short, long)]
        force: bool,
    },
    /// Render a .fountain file, or a directory of them, to HTML
    Render {
        path: PathBuf,
        /// Output file (single input) or directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite existing .html files
        #[arg(short, long)]
        force: bool,
    },
    /// Resolve the IMSDb script URL for one title
    Search { title: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::List { limit } => {
            store::ensure_dir(&settings.output_dir)?;
            let mut movies = imdb::fetch_top250(&settings).await?;
            if movies.is_empty() {
                bail!("No movies found on the IMDb chart. Check network/proxy settings.");
            }
            if let Some(n) = limit {
                movies.truncate(n);
            }
            println!("Looking up {} movies on IMSDb...", movies.len());
            let total = movies.len();
            let found = scraper::locate_scripts(&settings, movies).await?;
            let path = settings.movie_list_path();
            store::save_list(&path, &found)?;
            println!("Found {} of {} screenplays. Saved to {}", found.len(), total, path.display());
            Ok(())
        }
        Commands::Scrape { limit, force } => {
            let path = settings.movie_list_path();
            let Some(mut movies) = store::load_list::<Movie>(&path)? else {
                bail!("Movie list not found: {}. Run 'list' first.", path.display());
            };
            let end = limit.unwrap_or(movies.len()).min(movies.len());
            println!("Scraping {} movies into {}...", end, settings.output_dir.display());
            let stats = scraper::scrape_screenplays(&settings, &mut movies[..end], force).await?;
            store::save_list(&path, &movies)?;
            println!(
                "Done: {} downloaded ({} ok, {} too short, {} errors), {} skipped.",
                stats.total, stats.ok, stats.too_short, stats.errors, stats.skipped
            );
            Ok(())
        }
        Commands::Convert {
            input,
            output,
            title,
            transcript,
        } => {
            let html = fs::read_to_string(&input).with_context(|| format!("Failed to read {}", input.display()))?;
            let opts = ForwardOptions {
                title,
                min_content_chars: settings.min_content_chars,
                format: if transcript {
                    SourceFormat::Transcript
                } else {
                    SourceFormat::Screenplay
                },
            };
            let fountain = parser::convert_forward_with(&html, &opts)
                .into_result()
                .with_context(|| format!("No usable screenplay in {}", input.display()))?;
            match output {
                Some(out) => {
                    fs::write(&out, fountain).with_context(|| format!("Failed to write {}", out.display()))?;
                    println!("Saved {}", out.display());
                }
                None => println!("{}", fountain),
            }
            Ok(())
        }
        Commands::Episodes { url, limit } => {
            let show_url = url.unwrap_or_else(|| settings.imsdb_show_url.clone());
            let client = ImsdbClient::new(&settings)?;
            let mut episodes = client.fetch_episode_list(&show_url).await?;
            if episodes.is_empty() {
                bail!("No episodes found on {}", show_url);
            }
            if let Some(n) = limit {
                episodes.truncate(n);
            }
            println!("Looking up {} transcripts...", episodes.len());
            let found = scraper::locate_transcripts(&settings, &mut episodes).await?;
            let path = settings.episode_list_path();
            store::save_list(&path, &episodes)?;
            println!("Found {} of {} transcripts. Saved to {}", found, episodes.len(), path.display());
            Ok(())
        }
        Commands::Transcripts { limit, force } => {
            let path = settings.episode_list_path();
            let Some(mut episodes) = store::load_list::<Episode>(&path)? else {
                bail!("Episode list not found: {}. Run 'episodes' first.", path.display());
            };
            let end = limit.unwrap_or(episodes.len()).min(episodes.len());
            scraper::locate_transcripts(&settings, &mut episodes[..end]).await?;
            println!("Scraping {} episodes into {}...", end, settings.transcripts_dir.display());
            let stats = scraper::scrape_transcripts(&settings, &mut episodes[..end], force).await?;
            store::save_list(&path, &episodes)?;
            println!(
                "Done: {} downloaded ({} ok, {} too short, {} errors), {} skipped.",
                stats.total, stats.ok, stats.too_short, stats.errors, stats.skipped
            );
            Ok(())
        }
        Commands::Render { path, output, force } => render_path(&path, output.as_deref(), force),
        Commands::Search { title } => {
            let client = ImsdbClient::new(&settings)?;
            let mut cache = ListingCache::new();
            match client.find_script_url(&title, &mut cache).await? {
                Some(url) => println!("{}", url),
                None => println!("No script found for {:?}", title),
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn render_path(path: &Path, output: Option<&Path>, force: bool) -> anyhow::Result<()> {
    if path.is_dir() {
        let stats = render::render_dir(path, output, force)?;
        println!(
            "Rendered {} of {} files ({} skipped, {} errors).",
            stats.rendered, stats.total, stats.skipped, stats.errors
        );
        return Ok(());
    }

    let out = match output {
        Some(o) if o.is_dir() => render::html_path(path, Some(o)),
        Some(o) => o.to_path_buf(),
        None => render::html_path(path, None),
    };
    if out.exists() && !force {
        println!("{} exists, skipping (use --force).", out.display());
        return Ok(());
    }
    render::render_file(path, &out)?;
    println!("Saved {}", out.display());
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
