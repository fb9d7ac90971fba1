//! Incremental parser for the text report printed by `mkvinfo`.

use tracing::{debug, trace};

use super::track::{Track, TrackType, DEFAULT_LANGUAGE, INVALID_TRACK_NUMBER};
use crate::process::LineSink;

/// Line opening a new track section.
const TRACK_MARKER: &str = "| + Track";

const NUMBER_PREFIX: &str = "|  + Track number:";
const UID_PREFIX: &str = "|  + Track UID:";
const TYPE_PREFIX: &str = "|  + Track type:";
const LANGUAGE_PREFIX: &str = "|  + Language:";
const DEFAULT_FLAG_PREFIX: &str = "|  + Default track flag:";

/// Assembles [`Track`] records from `mkvinfo` output, one line at a time.
///
/// The parser owns the track currently being filled. A track is pushed to the
/// result when the next marker arrives or when [`TrackListParser::finish`] is
/// called, so the last track of the report is never lost.
#[derive(Debug, Default)]
pub struct TrackListParser {
    tracks: Vec<Track>,
    current: Option<Track>,
    finished: bool,
}

impl TrackListParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one line of the report.
    pub fn feed(&mut self, line: &str) {
        if line == TRACK_MARKER {
            if let Some(track) = self.current.take() {
                self.tracks.push(track);
            }
            self.current = Some(Track::new());
            return;
        }

        let Some(current) = self.current.as_mut() else {
            return;
        };

        if let Some(rest) = line.strip_prefix(NUMBER_PREFIX) {
            current.number = value_token(rest)
                .parse()
                .unwrap_or(INVALID_TRACK_NUMBER);
        } else if let Some(rest) = line.strip_prefix(UID_PREFIX) {
            current.uid = value_token(rest).to_string();
        } else if let Some(rest) = line.strip_prefix(TYPE_PREFIX) {
            current.track_type = value_token(rest).parse().unwrap_or(TrackType::Unknown);
        } else if let Some(rest) = line.strip_prefix(LANGUAGE_PREFIX) {
            let language = value_token(rest);
            current.language = if language.is_empty() {
                DEFAULT_LANGUAGE.to_string()
            } else {
                language.to_lowercase()
            };
        } else if let Some(rest) = line.strip_prefix(DEFAULT_FLAG_PREFIX) {
            current.is_default = matches!(value_token(rest), "1" | "yes" | "true");
        } else {
            trace!(line, "Ignoring mkvinfo line");
        }
    }

    /// Flushes the pending track. Calling it more than once has no effect.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        if let Some(track) = self.current.take() {
            self.tracks.push(track);
        }
        self.finished = true;
        debug!(count = self.tracks.len(), "Finished reading tracks");
    }

    /// Returns the assembled tracks, flushing any pending one.
    pub fn into_tracks(mut self) -> Vec<Track> {
        self.finish();
        self.tracks
    }
}

impl LineSink for TrackListParser {
    fn on_line(&mut self, line: &str) {
        self.feed(line);
    }

    fn on_end(&mut self) {
        self.finish();
    }
}

/// Returns the first whitespace-delimited token following a field label.
fn value_token(rest: &str) -> &str {
    rest.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
+ EBML head
|+ Segment tracks
| + Track
|  + Track number: 1 (track ID for mkvmerge & mkvextract: 0)
|  + Track UID: 1111
|  + Track type: video
|  + Language: und
| + Track
|  + Track number: 2 (track ID for mkvmerge & mkvextract: 1)
|  + Track UID: 2222
|  + Track type: audio
|  + Default track flag: 1
|  + Language: jpn
| + Track
|  + Track number: 3 (track ID for mkvmerge & mkvextract: 2)
|  + Track UID: 3333
|  + Track type: audio
|  + Language: eng";

    fn parse(report: &str) -> Vec<Track> {
        let mut parser = TrackListParser::new();
        for line in report.lines() {
            parser.feed(line);
        }
        parser.into_tracks()
    }

    #[test]
    fn last_track_is_flushed_at_end_of_stream() {
        let tracks = parse(REPORT);
        assert_eq!(tracks.len(), 3);

        let last = &tracks[2];
        assert_eq!(last.number, 3);
        assert_eq!(last.uid, "3333");
        assert_eq!(last.track_type, TrackType::Audio);
        assert_eq!(last.language, "eng");
    }

    #[test]
    fn fields_are_assigned_to_their_track() {
        let tracks = parse(REPORT);
        assert_eq!(tracks[0].track_type, TrackType::Video);
        assert_eq!(tracks[0].language, "und");
        assert!(!tracks[0].is_default);
        assert_eq!(tracks[1].language, "jpn");
        assert!(tracks[1].is_default);
    }

    #[test]
    fn malformed_values_degrade_to_sentinels() {
        let report = "\
| + Track
|  + Track number: abc
|  + Track UID:
|  + Track type: buttons";
        let tracks = parse(report);

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].number, INVALID_TRACK_NUMBER);
        assert_eq!(tracks[0].uid, "");
        assert_eq!(tracks[0].track_type, TrackType::Unknown);
        assert_eq!(tracks[0].language, DEFAULT_LANGUAGE);
    }

    #[test]
    fn marker_without_fields_still_yields_a_track() {
        let tracks = parse("| + Track\n| + Track");
        assert_eq!(tracks.len(), 2);
    }

    #[test]
    fn unknown_and_orphan_lines_are_ignored() {
        let report = "\
|  + Track number: 9
| + Track
|  + Codec ID: A_AAC
|  + Language (IETF BCP 47): en
|  + Track number: 1";
        let tracks = parse(report);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].number, 1);
        assert_eq!(tracks[0].language, DEFAULT_LANGUAGE);
    }

    #[test]
    fn finish_is_idempotent() {
        let mut parser = TrackListParser::new();
        parser.on_line("| + Track");
        parser.on_end();
        parser.on_end();
        assert_eq!(parser.into_tracks().len(), 1);
    }

    #[test]
    fn empty_report_yields_no_track() {
        assert!(parse("").is_empty());
    }
}
