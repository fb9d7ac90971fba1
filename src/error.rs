//! Error types for the track swapper.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of one file's read-then-swap pass.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Track read error: {0}")]
    Read(#[from] ReadError),

    #[error("Track swap error: {0}")]
    Swap(#[from] SwapError),
}

/// Configuration loading and parsing errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {message}")]
    ParseFailed { path: PathBuf, message: String },

    #[error("Config validation failed with {error_count} error(s)")]
    ValidationFailed { error_count: usize },
}

/// Failures of a single external tool invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("{tool} could not be started: {message}")]
    SpawnFailed { tool: String, message: String },

    #[error("{tool} failed with exit code {code:?}: {stderr}")]
    NonZeroExit {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} timed out after {} seconds", .timeout.as_secs_f64())]
    Timeout { tool: String, timeout: Duration },

    #[error("{tool} was cancelled")]
    Cancelled { tool: String },

    #[error("{tool} runner was already used")]
    AlreadyRan { tool: String },
}

/// Metadata reader errors.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Failed to read tracks from '{path}': {source}")]
    Process {
        path: PathBuf,
        source: ProcessError,
    },
}

/// Track processor errors.
#[derive(Error, Debug)]
pub enum SwapError {
    #[error("No track found in '{path}', nothing to do")]
    NoTracksFound { path: PathBuf },

    #[error("Failed to prepare output for '{path}': {source}")]
    OutputPath {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Remux of '{path}' failed: {source}")]
    Remux {
        path: PathBuf,
        source: ProcessError,
    },

    #[error("Failed to replace '{path}' with the remuxed file: {source}")]
    ReplaceFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}
