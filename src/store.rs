use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const MOVIE_LIST_FILE: &str = "movie_list.json";
pub const EPISODE_LIST_FILE: &str = "episode_list.json";

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

/// Load a JSON index (movie or episode list). `Ok(None)` when none has been saved yet.
pub fn load_list<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let items = serde_json::from_str(&json).with_context(|| format!("Malformed list {}", path.display()))?;
    Ok(Some(items))
}

pub fn save_list<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(items)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn fountain_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{}.fountain", stem))
}

pub fn save_fountain(dir: &Path, stem: &str, text: &str) -> Result<PathBuf> {
    let path = fountain_path(dir, stem);
    fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// All `.fountain` files directly inside `dir`, sorted by name.
pub fn fountain_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "fountain"))
        .collect();
    files.sort();
    Ok(files)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Episode, Movie};

    #[test]
    fn missing_list_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_list::<Movie>(&dir.path().join(MOVIE_LIST_FILE)).unwrap().is_none());
    }

    #[test]
    fn list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(MOVIE_LIST_FILE);
        let mut m = Movie::new("Casablanca", 1942, "tt0034583");
        m.imsdb_url = Some("https://imsdb.com/scripts/Casablanca.html".into());

        save_list(&path, &[m.clone()]).unwrap();
        let loaded: Vec<Movie> = load_list(&path).unwrap().unwrap();
        assert_eq!(loaded, vec![m]);
    }

    #[test]
    fn episode_list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EPISODE_LIST_FILE);
        let mut ep = Episode::new("Pilot", 1, 1);
        ep.transcript_url = Some("https://imsdb.com/transcripts/South-Park-Pilot.html".into());

        save_list(&path, &[ep.clone()]).unwrap();
        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"episode_num\": 1"));
        assert!(!json.contains("scraped_at"));
        assert_eq!(load_list::<Episode>(&path).unwrap().unwrap(), vec![ep]);
    }

    #[test]
    fn malformed_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MOVIE_LIST_FILE);
        fs::write(&path, "{not json").unwrap();
        assert!(load_list::<Movie>(&path).is_err());
    }

    #[test]
    fn screenplay_written_under_safe_name() {
        let dir = tempfile::tempdir().unwrap();
        let movie = Movie::new("Alien: Resurrection", 1997, "tt0118583");
        let path = save_fountain(dir.path(), &movie.safe_filename(), "Fog.").unwrap();
        assert_eq!(path, dir.path().join("Alien- Resurrection (1997).fountain"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Fog.");
        assert_eq!(fountain_files(dir.path()).unwrap(), vec![path]);
    }

    #[test]
    fn lists_only_fountain_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.fountain"), "").unwrap();
        fs::write(dir.path().join("a.fountain"), "").unwrap();
        fs::write(dir.path().join("a.html"), "").unwrap();
        let names: Vec<_> = fountain_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.fountain", "b.fountain"]);
    }
}
