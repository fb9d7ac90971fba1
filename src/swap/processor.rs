//! Applies the reordering decision to a container through mkvmerge.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tempfile::TempPath;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::decision::{self, LanguageMatch, LanguageRequest, Swap};
use super::mkvmerge::{swapped_output_path, RemuxArgs, ERROR_PREFIX};
use crate::config::model::ToolsConfig;
use crate::error::SwapError;
use crate::media::{ContainerHandle, Track};
use crate::process::ProcessRunner;

/// What the processor should do with each container.
#[derive(Debug, Clone)]
pub struct SwapSettings {
    pub requests: Vec<LanguageRequest>,
    pub language_match: LanguageMatch,
    /// Replace the source file instead of writing a `_swapped` sibling.
    pub overwrite: bool,
    /// Compute and report the decision without running mkvmerge.
    pub dry_run: bool,
}

/// Result of processing one container.
#[derive(Debug, Clone, Serialize)]
pub struct SwapReport {
    pub input: PathBuf,
    /// File holding the reordered tracks.
    pub output: PathBuf,
    pub swaps: Vec<Swap>,
    pub tracks: Vec<Track>,
    /// mkvmerge arguments, rendered for display.
    pub command: String,
    pub dry_run: bool,
}

/// Reorders tracks and drives the remux invocation.
#[derive(Debug, Clone)]
pub struct TrackProcessor {
    settings: SwapSettings,
    program: String,
    prefer_bundled: bool,
    timeout: Option<Duration>,
}

impl TrackProcessor {
    pub fn new(
        settings: SwapSettings,
        program: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            settings,
            program: program.into(),
            prefer_bundled: true,
            timeout,
        }
    }

    /// Builds a processor from the tools section of the configuration.
    pub fn from_config(
        settings: SwapSettings,
        tools: &ToolsConfig,
        timeout: Option<Duration>,
    ) -> Self {
        Self::new(settings, tools.remux.clone(), timeout).prefer_bundled(tools.prefer_bundled)
    }

    pub fn prefer_bundled(mut self, prefer: bool) -> Self {
        self.prefer_bundled = prefer;
        self
    }

    pub fn settings(&self) -> &SwapSettings {
        &self.settings
    }

    /// Puts the wanted tracks first and writes the result.
    ///
    /// Fails without spawning anything when the container has no track.
    pub async fn put_tracks_first(
        &self,
        mut handle: ContainerHandle,
        cancel: &CancellationToken,
    ) -> Result<SwapReport, SwapError> {
        if handle.tracks.is_empty() {
            return Err(SwapError::NoTracksFound {
                path: handle.path().to_path_buf(),
            });
        }

        let swaps = decision::apply(
            &mut handle,
            &self.settings.requests,
            self.settings.language_match,
        );
        if swaps.is_empty() {
            debug!(file = ?handle.path(), "No track needs to move");
        }

        if self.settings.dry_run {
            let output = if self.settings.overwrite {
                handle.path().to_path_buf()
            } else {
                swapped_output_path(handle.path())
            };
            let args = RemuxArgs::build(&handle, &swaps, &output);
            for track in &handle.tracks {
                info!(
                    number = track.number,
                    uid = %track.uid,
                    track_type = %track.track_type,
                    language = %track.language,
                    default = track.is_default,
                    "Track"
                );
            }
            info!(file = ?handle.path(), command = %args, "Dry run, not remuxing");
            return Ok(report(handle, swaps, &args, output, true));
        }

        let target = OutputTarget::prepare(handle.path(), self.settings.overwrite)?;
        let args = RemuxArgs::build(&handle, &swaps, target.path());
        info!(file = ?handle.path(), command = %args, "Remuxing");

        let mut runner = ProcessRunner::new(self.program.clone())
            .timeout(self.timeout)
            .prefer_bundled(self.prefer_bundled)
            .error_prefix(ERROR_PREFIX);
        let outcome = runner.run(args.to_args(), cancel).await;
        runner.dispose();

        let diagnostics = outcome.error.clone();
        if let Err(source) = outcome.into_result() {
            target.discard();
            return Err(SwapError::Remux {
                path: handle.path().to_path_buf(),
                source,
            });
        }
        if !diagnostics.trim().is_empty() {
            warn!(
                file = ?handle.path(),
                diagnostics = %diagnostics.trim_end(),
                "mkvmerge reported problems"
            );
        }

        let output = target.commit(handle.path()).await?;
        info!(file = ?handle.path(), output = ?output, swaps = swaps.len(), "Tracks swapped");

        Ok(report(handle, swaps, &args, output, false))
    }
}

fn report(
    handle: ContainerHandle,
    swaps: Vec<Swap>,
    args: &RemuxArgs,
    output: PathBuf,
    dry_run: bool,
) -> SwapReport {
    SwapReport {
        input: handle.path().to_path_buf(),
        output,
        swaps,
        tracks: handle.tracks,
        command: args.to_string(),
        dry_run,
    }
}

/// Where mkvmerge writes its output.
#[derive(Debug)]
enum OutputTarget {
    /// A new `_swapped` file next to the source.
    Sibling(PathBuf),
    /// A temporary file next to the source, renamed over it on success and
    /// deleted otherwise.
    Replace(TempPath),
}

impl OutputTarget {
    fn prepare(input: &Path, overwrite: bool) -> Result<Self, SwapError> {
        if !overwrite {
            return Ok(Self::Sibling(swapped_output_path(input)));
        }

        let dir = input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let suffix = input
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let temp = tempfile::Builder::new()
            .prefix(".swap-")
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|source| SwapError::OutputPath {
                path: input.to_path_buf(),
                source,
            })?;

        Ok(Self::Replace(temp.into_temp_path()))
    }

    fn path(&self) -> &Path {
        match self {
            Self::Sibling(path) => path.as_path(),
            Self::Replace(temp) => &**temp,
        }
    }

    /// Removes whatever a failed remux left behind.
    fn discard(self) {
        match self {
            Self::Sibling(path) => {
                if path.exists() {
                    if let Err(e) = std::fs::remove_file(&path) {
                        warn!(path = ?path, error = %e, "Failed to remove partial output");
                    }
                }
            }
            Self::Replace(temp) => {
                if let Err(e) = temp.close() {
                    warn!(error = %e, "Failed to remove temporary output");
                }
            }
        }
    }

    /// Moves the output into its final place and returns that place.
    ///
    /// A replacement takes over the permissions of the file it replaces.
    async fn commit(self, original: &Path) -> Result<PathBuf, SwapError> {
        match self {
            Self::Sibling(path) => Ok(path),
            Self::Replace(temp) => {
                let target = original.to_path_buf();
                let destination = target.clone();
                let persisted = tokio::task::spawn_blocking(move || {
                    let permissions = std::fs::metadata(&destination)?.permissions();
                    std::fs::set_permissions(&temp, permissions)?;
                    temp.persist(&destination).map_err(|e| e.error)
                })
                .await
                .map_err(std::io::Error::other)
                .and_then(|result| result);

                persisted.map_err(|source| SwapError::ReplaceFailed {
                    path: target.clone(),
                    source,
                })?;

                Ok(target)
            }
        }
    }
}
