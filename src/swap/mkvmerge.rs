//! mkvmerge command line rendering and output naming.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::media::ContainerHandle;

use super::decision::Swap;

/// Prefix mkvmerge uses for errors it prints on stdout.
pub const ERROR_PREFIX: &str = "Error:";

/// Suffix appended to the stem of a non-destructive output file.
const SWAPPED_SUFFIX: &str = "_swapped";

/// Container index of the single source file in `--track-order`.
const SOURCE_FILE_INDEX: u32 = 0;

/// Arguments of one mkvmerge invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemuxArgs {
    pub output: PathBuf,
    /// Zero-based source track ids to flag as default.
    pub default_tracks: Vec<i64>,
    /// Zero-based source track ids in output order.
    pub track_order: Vec<i64>,
    pub input: PathBuf,
}

impl RemuxArgs {
    /// Renders the decision taken on `handle` into mkvmerge arguments.
    ///
    /// mkvinfo numbers tracks from 1 while mkvmerge track ids start at 0.
    pub fn build(handle: &ContainerHandle, swaps: &[Swap], output: &Path) -> Self {
        Self {
            output: output.to_path_buf(),
            default_tracks: swaps.iter().map(|s| track_id(s.source_number)).collect(),
            track_order: handle.tracks.iter().map(|t| track_id(t.number)).collect(),
            input: handle.path().to_path_buf(),
        }
    }

    /// Value of the `--track-order` option, e.g. `0:0,0:2,0:1`.
    pub fn track_order_value(&self) -> String {
        self.track_order
            .iter()
            .map(|id| format!("{SOURCE_FILE_INDEX}:{id}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Returns the argument vector passed to mkvmerge.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--output".into(), self.output.clone().into()];

        for id in &self.default_tracks {
            args.push("--default-track".into());
            args.push(format!("{id}:yes").into());
        }

        args.push("--track-order".into());
        args.push(self.track_order_value().into());
        args.push(self.input.clone().into());

        args
    }
}

impl fmt::Display for RemuxArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--output \"{}\"", self.output.display())?;
        for id in &self.default_tracks {
            write!(f, " --default-track {id}:yes")?;
        }
        write!(
            f,
            " --track-order {} \"{}\"",
            self.track_order_value(),
            self.input.display()
        )
    }
}

fn track_id(number: i32) -> i64 {
    i64::from(number) - 1
}

/// Returns a free sibling path for the remuxed copy of `input`.
///
/// `movie.mkv` becomes `movie_swapped.mkv`, then `movie_swapped_1.mkv`,
/// `movie_swapped_2.mkv` and so on while the candidate exists.
pub fn swapped_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut candidate = input.with_file_name(format!("{stem}{SWAPPED_SUFFIX}{extension}"));
    let mut index: u32 = 1;
    while candidate.exists() {
        candidate = input.with_file_name(format!("{stem}{SWAPPED_SUFFIX}_{index}{extension}"));
        index += 1;
    }

    candidate
}
