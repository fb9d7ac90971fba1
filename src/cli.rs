//! Command-line interface definitions.

use clap::Parser;
use std::path::PathBuf;

/// Puts the audio and subtitle tracks of MKV files in the wanted language first.
#[derive(Parser, Debug)]
#[command(name = "mkv-tracks-swapper", version, about, long_about = None)]
pub struct Cli {
    /// MKV files or directories to search recursively.
    pub paths: Vec<PathBuf>,

    /// Language of the audio track to put first (e.g. "eng", "jpn").
    #[arg(short, long, value_name = "LANG")]
    pub audio: Option<String>,

    /// Language of the subtitles track to put first.
    #[arg(short, long, value_name = "LANG")]
    pub subtitles: Option<String>,

    /// Replace the original files instead of writing "_swapped" copies.
    #[arg(short = 'f', long)]
    pub overwrite: bool,

    /// Path to an optional YAML configuration file.
    #[arg(short, long, env = "MKV_SWAPPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Require an exact language match instead of a prefix match.
    #[arg(long)]
    pub exact_language: bool,

    /// Maximum number of files processed at the same time.
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<usize>,

    /// Show what would be done without remuxing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json_logs: bool,

    /// Increase logging verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Returns the log level based on verbosity flags.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Returns true when at least one language was requested.
    pub fn has_languages(&self) -> bool {
        self.audio.is_some() || self.subtitles.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let cli = Cli::parse_from([
            "mkv-tracks-swapper",
            "-a",
            "eng",
            "-s",
            "fre",
            "-f",
            "-vv",
            "movies/",
        ]);
        assert_eq!(cli.audio.as_deref(), Some("eng"));
        assert_eq!(cli.subtitles.as_deref(), Some("fre"));
        assert!(cli.overwrite);
        assert_eq!(cli.log_level(), "trace");
        assert_eq!(cli.paths, vec![PathBuf::from("movies/")]);
    }

    #[test]
    fn no_language_means_nothing_to_do() {
        let cli = Cli::parse_from(["mkv-tracks-swapper", "movie.mkv"]);
        assert!(!cli.has_languages());
        assert_eq!(cli.log_level(), "info");
    }
}
