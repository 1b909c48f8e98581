use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::parser::{self, layout::title_from_stem};
use crate::store;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderStats {
    pub total: usize,
    pub rendered: usize,
    pub skipped: usize,
    pub errors: usize,
}

enum Rendered {
    Written,
    Skipped,
    Failed,
}

/// `<out_dir or input dir>/<stem>.html`.
pub fn html_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let dir = out_dir.or_else(|| input.parent()).unwrap_or_else(|| Path::new("."));
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    dir.join(format!("{}.html", stem))
}

/// Reverse-convert one `.fountain` file into a standalone HTML layout page.
/// The file stem supplies the title when the text has no `Title:` line.
pub fn render_file(input: &Path, output: &Path) -> Result<()> {
    let text = fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let hint = input
        .file_stem()
        .map(|s| title_from_stem(&s.to_string_lossy()));
    let doc = parser::convert_reverse(&text, hint.as_deref());
    fs::write(output, doc.to_html()).with_context(|| format!("Failed to write {}", output.display()))
}

/// Render every `.fountain` file in `dir` in parallel.
pub fn render_dir(dir: &Path, out_dir: Option<&Path>, force: bool) -> Result<RenderStats> {
    let files = store::fountain_files(dir)?;
    if let Some(out) = out_dir {
        store::ensure_dir(out)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let results: Vec<Rendered> = files
        .par_iter()
        .map(|input| {
            let output = html_path(input, out_dir);
            let rendered = if !force && output.exists() {
                Rendered::Skipped
            } else {
                match render_file(input, &output) {
                    Ok(()) => Rendered::Written,
                    Err(e) => {
                        warn!("{:#}", e);
                        Rendered::Failed
                    }
                }
            };
            pb.inc(1);
            rendered
        })
        .collect();
    pb.finish_and_clear();

    let mut stats = RenderStats {
        total: files.len(),
        ..RenderStats::default()
    };
    for r in results {
        match r {
            Rendered::Written => stats.rendered += 1,
            Rendered::Skipped => stats.skipped += 1,
            Rendered::Failed => stats.errors += 1,
        }
    }
    info!(
        "Rendered {} of {} files ({} skipped, {} errors)",
        stats.rendered, stats.total, stats.skipped, stats.errors
    );
    Ok(stats)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "INT. HOUSE - DAY\n\nRICK\n(beat)\nHello.\n\n> CUT TO:\n";

    #[test]
    fn html_path_placement() {
        assert_eq!(
            html_path(Path::new("scripts/Casablanca (1942).fountain"), None),
            PathBuf::from("scripts/Casablanca (1942).html")
        );
        assert_eq!(
            html_path(Path::new("scripts/S01E01_Pilot.fountain"), Some(Path::new("out"))),
            PathBuf::from("out/S01E01_Pilot.html")
        );
        assert_eq!(
            html_path(Path::new("Mr. Smith (1939).fountain"), None),
            PathBuf::from("Mr. Smith (1939).html")
        );
    }

    #[test]
    fn stem_becomes_title() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("S02E03_Weight_Gain_4000.fountain");
        fs::write(&input, SCRIPT).unwrap();
        let output = dir.path().join("out.html");

        render_file(&input, &output).unwrap();
        let html = fs::read_to_string(&output).unwrap();
        assert!(html.contains("<h1>Weight Gain 4000</h1>"));
        assert!(html.contains("<div class=\"scene-heading\">INT. HOUSE - DAY</div>"));
        assert!(html.contains("<div class=\"character\">RICK</div>"));
    }

    #[test]
    fn batch_skips_existing_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c"] {
            fs::write(dir.path().join(format!("{}.fountain", name)), SCRIPT).unwrap();
        }
        fs::write(dir.path().join("b.html"), "old").unwrap();

        let stats = render_dir(dir.path(), None, false).unwrap();
        assert_eq!(stats, RenderStats { total: 3, rendered: 2, skipped: 1, errors: 0 });
        assert_eq!(fs::read_to_string(dir.path().join("b.html")).unwrap(), "old");

        let stats = render_dir(dir.path(), None, true).unwrap();
        assert_eq!(stats.rendered, 3);
        assert_ne!(fs::read_to_string(dir.path().join("b.html")).unwrap(), "old");
    }

    #[test]
    fn separate_output_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.fountain"), SCRIPT).unwrap();
        let out = dir.path().join("html");
        let stats = render_dir(dir.path(), Some(&out), false).unwrap();
        assert_eq!(stats.rendered, 1);
        assert!(out.join("a.html").exists());
    }
}
