//! Track reordering decisions.
//!
//! For every requested `(type, language)` pair the first track of that type
//! trades its number with the first track of that type in the wanted
//! language. Numbers are only ever exchanged, so the set of numbers in a
//! container never changes. The wanted track becomes the only default track
//! of its type.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::media::{ContainerHandle, Track, TrackType};

/// How a requested language is compared with a track's language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMatch {
    /// The track language starts with the requested one (`en` matches `eng`).
    #[default]
    Prefix,
    /// The languages must be identical.
    Exact,
}

impl LanguageMatch {
    pub fn matches(self, track_language: &str, wanted: &str) -> bool {
        let wanted = wanted.to_lowercase();
        match self {
            Self::Prefix => track_language.starts_with(&wanted),
            Self::Exact => track_language == wanted,
        }
    }
}

/// A language requested for one track type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRequest {
    pub track_type: TrackType,
    pub language: String,
}

impl LanguageRequest {
    pub fn new(track_type: TrackType, language: impl Into<String>) -> Self {
        Self {
            track_type,
            language: language.into(),
        }
    }

    /// Builds the requests for the optional audio and subtitles languages.
    pub fn from_languages(audio: Option<&str>, subtitles: Option<&str>) -> Vec<Self> {
        let mut requests = Vec::new();
        if let Some(language) = audio {
            requests.push(Self::new(TrackType::Audio, language));
        }
        if let Some(language) = subtitles {
            requests.push(Self::new(TrackType::Subtitles, language));
        }
        requests
    }
}

/// A swap that took place for one track type.
///
/// mkvmerge only receives `--default-track <id>:yes` for the wanted track.
/// The flag of the track it displaces is left as the source had it, so a
/// source whose first track was already flagged default keeps that flag in
/// the output even though the model clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Swap {
    pub track_type: TrackType,
    /// Number the wanted track had before the swap; it identifies the
    /// track in the source file.
    pub source_number: i32,
    /// Number the wanted track holds after the swap.
    pub new_number: i32,
}

/// Swaps the wanted track of `track_type` ahead of the first one.
///
/// Returns `None`, leaving the tracks untouched, when the type has no track,
/// no track in the wanted language, or already starts with it.
pub fn swap_track_number_for_type(
    tracks: &mut [Track],
    track_type: TrackType,
    language: &str,
    mode: LanguageMatch,
) -> Option<Swap> {
    let first = tracks.iter().position(|t| t.track_type == track_type)?;
    let wanted = tracks
        .iter()
        .position(|t| t.track_type == track_type && mode.matches(&t.language, language))?;

    if first == wanted {
        debug!(%track_type, language, "First track already in the wanted language");
        return None;
    }

    let source_number = tracks[wanted].number;
    let new_number = tracks[first].number;
    tracks[wanted].number = new_number;
    tracks[first].number = source_number;

    for (i, track) in tracks.iter_mut().enumerate() {
        if track.track_type == track_type {
            track.is_default = i == wanted;
        }
    }

    debug!(%track_type, language, source_number, new_number, "Swapped tracks");

    Some(Swap {
        track_type,
        source_number,
        new_number,
    })
}

/// Applies every request to the container, in order.
pub fn apply(
    handle: &mut ContainerHandle,
    requests: &[LanguageRequest],
    mode: LanguageMatch,
) -> Vec<Swap> {
    requests
        .iter()
        .filter_map(|r| {
            swap_track_number_for_type(&mut handle.tracks, r.track_type, &r.language, mode)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::LanguageMatch::{Exact, Prefix};

    fn sample() -> Vec<Track> {
        vec![
            Track::with(1, "v1", TrackType::Video, "und"),
            Track::with(2, "a1", TrackType::Audio, "jpn"),
            Track::with(3, "a2", TrackType::Audio, "eng"),
        ]
    }

    fn numbers(tracks: &[Track]) -> Vec<i32> {
        tracks.iter().map(|t| t.number).collect()
    }

    #[test]
    fn swaps_numbers_of_first_and_wanted_track() {
        let mut tracks = sample();
        let swap = swap_track_number_for_type(&mut tracks, TrackType::Audio, "eng", Prefix);

        assert_eq!(
            swap,
            Some(Swap {
                track_type: TrackType::Audio,
                source_number: 3,
                new_number: 2,
            })
        );
        assert_eq!(numbers(&tracks), vec![1, 3, 2]);
        assert!(tracks[2].is_default);
        assert!(!tracks[1].is_default);
    }

    #[test]
    fn already_first_is_a_no_op() {
        let mut tracks = sample();
        let swap = swap_track_number_for_type(&mut tracks, TrackType::Audio, "jpn", Exact);
        assert_eq!(swap, None);
        assert_eq!(numbers(&tracks), vec![1, 2, 3]);

        let again = swap_track_number_for_type(&mut tracks, TrackType::Audio, "jpn", Exact);
        assert_eq!(again, None);
    }

    #[test]
    fn missing_type_or_language_is_a_no_op() {
        let mut tracks = sample();
        assert_eq!(
            swap_track_number_for_type(&mut tracks, TrackType::Subtitles, "eng", Prefix),
            None
        );
        assert_eq!(
            swap_track_number_for_type(&mut tracks, TrackType::Audio, "fre", Prefix),
            None
        );
        assert_eq!(numbers(&tracks), vec![1, 2, 3]);
        assert!(tracks.iter().all(|t| !t.is_default));
    }

    #[test]
    fn prefix_matching_accepts_shorter_codes() {
        let mut tracks = sample();
        let swap = swap_track_number_for_type(&mut tracks, TrackType::Audio, "en", Prefix);
        assert!(swap.is_some());

        let mut tracks = sample();
        let swap = swap_track_number_for_type(&mut tracks, TrackType::Audio, "en", Exact);
        assert!(swap.is_none());
    }

    #[test]
    fn requested_language_is_case_insensitive() {
        assert!(Exact.matches("eng", "ENG"));
        assert!(Prefix.matches("eng", "En"));
        assert!(!Prefix.matches("en", "eng"));
    }

    #[test]
    fn swaps_keep_numbers_a_permutation() {
        let languages = ["jpn", "eng", "fre", "ger"];
        for wanted in &languages {
            for sub in &languages {
                let mut handle = ContainerHandle::new(
                    "movie.mkv",
                    vec![
                        Track::with(1, "v", TrackType::Video, "und"),
                        Track::with(2, "a1", TrackType::Audio, "jpn"),
                        Track::with(3, "s1", TrackType::Subtitles, "fre"),
                        Track::with(4, "a2", TrackType::Audio, "fre"),
                        Track::with(5, "s2", TrackType::Subtitles, "eng"),
                        Track::with(6, "a3", TrackType::Audio, "eng"),
                        Track::with(7, "s3", TrackType::Subtitles, "ger"),
                    ],
                );
                let requests = LanguageRequest::from_languages(Some(*wanted), Some(*sub));
                apply(&mut handle, &requests, Prefix);

                let mut sorted = numbers(&handle.tracks);
                sorted.sort_unstable();
                assert_eq!(sorted, vec![1, 2, 3, 4, 5, 6, 7], "audio {wanted}, subtitles {sub}");

                for track_type in [TrackType::Audio, TrackType::Subtitles] {
                    let defaults = handle
                        .tracks
                        .iter()
                        .filter(|t| t.track_type == track_type && t.is_default)
                        .count();
                    assert!(defaults <= 1);
                }
            }
        }
    }

    #[test]
    fn types_without_request_keep_their_order() {
        let mut handle = ContainerHandle::new(
            "movie.mkv",
            vec![
                Track::with(1, "a1", TrackType::Audio, "jpn"),
                Track::with(2, "s1", TrackType::Subtitles, "fre"),
                Track::with(3, "a2", TrackType::Audio, "eng"),
                Track::with(4, "s2", TrackType::Subtitles, "eng"),
            ],
        );
        let swaps = apply(
            &mut handle,
            &LanguageRequest::from_languages(Some("eng"), None),
            Prefix,
        );

        assert_eq!(swaps.len(), 1);
        assert_eq!(handle.tracks[1].number, 2);
        assert_eq!(handle.tracks[3].number, 4);
    }
}
