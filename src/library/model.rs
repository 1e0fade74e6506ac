use std::path::PathBuf;
use std::time::Duration;

/// Artist shown when the tags do not name one.
pub const UNKNOWN_ARTIST: &str = "<unknown>";

/// Where the cover art for a track can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtRef {
    /// The audio file carries an embedded picture.
    Embedded(PathBuf),
    /// A `cover.*` / `folder.*` image sits next to the audio file.
    Folder(PathBuf),
    None,
}

/// One playable audio file. Never mutated after the scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Path relative to the scanned directory.
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub album_art: ArtRef,
    /// Absolute path handed to the media engine.
    pub source: PathBuf,
    pub duration: Option<Duration>,
}

impl Track {
    /// `Artist - Title`, or just the title when the artist is unknown.
    pub fn display(&self) -> String {
        if self.artist.trim().is_empty() || self.artist == UNKNOWN_ARTIST {
            self.title.clone()
        } else {
            format!("{} - {}", self.artist, self.title)
        }
    }
}
