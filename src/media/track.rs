//! Track records as reported by the inspect tool.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

/// Language assumed for tracks that do not declare one.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Number assigned when the inspect tool reports an unparsable track number.
pub const INVALID_TRACK_NUMBER: i32 = i32::MIN;

/// Kind of elementary stream held by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Video,
    Audio,
    Subtitles,
    Unknown,
}

impl FromStr for TrackType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "subtitles" => Ok(Self::Subtitles),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitles => "subtitles",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One track of a container.
///
/// Equality and hashing only consider [`Track::uid`]: two records with the
/// same UID describe the same track, whatever their number or flags.
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    /// 1-based number assigned by the inspect tool.
    pub number: i32,
    /// Unique track identifier, possibly empty.
    pub uid: String,
    /// Stream kind.
    pub track_type: TrackType,
    /// Lowercase language code.
    pub language: String,
    /// Whether players should pick this track by default.
    pub is_default: bool,
}

impl Track {
    /// Creates an empty track awaiting its fields.
    pub fn new() -> Self {
        Self {
            number: INVALID_TRACK_NUMBER,
            uid: String::new(),
            track_type: TrackType::Unknown,
            language: DEFAULT_LANGUAGE.to_string(),
            is_default: false,
        }
    }

    /// Creates a fully specified track.
    pub fn with(
        number: i32,
        uid: impl Into<String>,
        track_type: TrackType,
        language: &str,
    ) -> Self {
        Self {
            number,
            uid: uid.into(),
            track_type,
            language: language.to_lowercase(),
            is_default: false,
        }
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

/// A container file together with the tracks read from it.
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    path: PathBuf,
    /// Tracks in the order the inspect tool reported them.
    pub tracks: Vec<Track>,
}

impl ContainerHandle {
    pub fn new(path: impl Into<PathBuf>, tracks: Vec<Track>) -> Self {
        Self {
            path: path.into(),
            tracks,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_is_keyed_on_uid() {
        let a = Track::with(1, "42", TrackType::Audio, "eng");
        let mut b = Track::with(7, "42", TrackType::Subtitles, "fre");
        b.is_default = true;
        let c = Track::with(1, "43", TrackType::Audio, "eng");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Track> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn new_track_uses_sentinels() {
        let track = Track::new();
        assert_eq!(track.number, INVALID_TRACK_NUMBER);
        assert_eq!(track.track_type, TrackType::Unknown);
        assert_eq!(track.language, "eng");
        assert!(track.uid.is_empty());
        assert!(!track.is_default);
    }

    #[test]
    fn track_type_parses_case_insensitively() {
        assert_eq!("Audio".parse(), Ok(TrackType::Audio));
        assert_eq!("subtitles".parse(), Ok(TrackType::Subtitles));
        assert_eq!("VIDEO".parse(), Ok(TrackType::Video));
        assert!("buttons".parse::<TrackType>().is_err());
    }
}
