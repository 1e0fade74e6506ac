use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{ArtRef, Track, UNKNOWN_ARTIST};

const ART_STEMS: [&str; 2] = ["cover", "folder"];
const ART_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Look for `cover.jpg`, `folder.png` and friends in `dir`.
fn find_folder_art(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries.filter_map(Result::ok).map(|e| e.path()).find(|p| {
        let stem = p
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase);
        let ext = p
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase);
        match (stem, ext) {
            (Some(stem), Some(ext)) => {
                p.is_file()
                    && ART_STEMS.contains(&stem.as_str())
                    && ART_EXTENSIONS.contains(&ext.as_str())
            }
            _ => false,
        }
    })
}

struct Tags {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    duration: Option<Duration>,
    has_picture: bool,
}

fn non_empty(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn read_tags(path: &Path) -> Option<Tags> {
    let tagged = match lofty::read_from_path(path) {
        Ok(t) => t,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "unreadable tags, using file name");
            return None;
        }
    };

    let has_picture = tagged.tags().iter().any(|t| !t.pictures().is_empty());
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag());

    Some(Tags {
        title: tag.and_then(|t| non_empty(t.title())),
        artist: tag.and_then(|t| non_empty(t.artist())),
        album: tag.and_then(|t| non_empty(t.album())),
        duration: Some(tagged.properties().duration()).filter(|d| !d.is_zero()),
        has_picture,
    })
}

/// Walk `dir` and return every audio file as a `Track`, sorted by
/// `artist - title` (case-insensitive).
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();
    let mut folder_art: HashMap<PathBuf, Option<PathBuf>> = HashMap::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || !is_audio_file(path, settings) {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        let tags = read_tags(path);

        let album_art = if tags.as_ref().is_some_and(|t| t.has_picture) {
            ArtRef::Embedded(path.to_path_buf())
        } else {
            let parent = path.parent().unwrap_or(dir).to_path_buf();
            folder_art
                .entry(parent)
                .or_insert_with_key(|p| find_folder_art(p))
                .clone()
                .map_or(ArtRef::None, ArtRef::Folder)
        };

        let (title, artist, album, duration) = match tags {
            Some(t) => (t.title, t.artist, t.album, t.duration),
            None => (None, None, None, None),
        };

        let id = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();
        let source = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        tracks.push(Track {
            id,
            title: title.unwrap_or(stem),
            artist: artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            album,
            album_art,
            source,
            duration,
        });
    }

    tracks.sort_by_cached_key(|t| t.display().to_lowercase());
    info!(dir = %dir.display(), count = tracks.len(), "library scanned");
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn is_audio_file_matches_configured_extensions_case_insensitive() {
        let settings = LibrarySettings::default();
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.MP3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.flac"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.ogg"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a.txt"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a"), &settings));
    }

    #[test]
    fn extensions_tolerate_leading_dots_and_case() {
        let settings = LibrarySettings {
            extensions: vec![".M4A".into(), "  ".into()],
            ..LibrarySettings::default()
        };
        assert!(is_audio_file(Path::new("/tmp/a.m4a"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a.mp3"), &settings));
    }

    #[test]
    fn find_folder_art_matches_cover_and_folder_images() {
        let dir = tempdir().unwrap();
        assert_eq!(find_folder_art(dir.path()), None);

        fs::write(dir.path().join("notes.jpg"), b"x").unwrap();
        assert_eq!(find_folder_art(dir.path()), None);

        fs::write(dir.path().join("Folder.PNG"), b"x").unwrap();
        assert_eq!(
            find_folder_art(dir.path()),
            Some(dir.path().join("Folder.PNG"))
        );
    }

    #[test]
    fn scan_respects_max_depth() {
        let dir = tempdir().unwrap();
        let d1 = dir.path().join("d1");
        let d2 = d1.join("d2");
        fs::create_dir_all(&d2).unwrap();
        fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
        fs::write(d1.join("one.mp3"), b"not real").unwrap();
        fs::write(d2.join("two.mp3"), b"not real").unwrap();

        // WalkDir depth counts root as 0, children as 1, grandchildren as 2.
        let settings = LibrarySettings {
            max_depth: Some(2),
            ..LibrarySettings::default()
        };
        let titles: Vec<String> = scan(dir.path(), &settings)
            .into_iter()
            .map(|t| t.title)
            .collect();

        assert!(titles.contains(&"root".to_string()));
        assert!(titles.contains(&"one".to_string()));
        assert!(!titles.contains(&"two".to_string()));
    }
}
