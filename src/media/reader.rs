//! Reads the track list of a container through `mkvinfo`.

use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::mkvinfo::TrackListParser;
use super::track::ContainerHandle;
use crate::config::model::ToolsConfig;
use crate::error::ReadError;
use crate::process::ProcessRunner;

/// Invokes the inspect tool and assembles its report into a [`ContainerHandle`].
#[derive(Debug, Clone)]
pub struct MetadataReader {
    program: String,
    prefer_bundled: bool,
    timeout: Option<Duration>,
}

impl MetadataReader {
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            prefer_bundled: true,
            timeout,
        }
    }

    /// Builds a reader from the tools section of the configuration.
    pub fn from_config(tools: &ToolsConfig, timeout: Option<Duration>) -> Self {
        Self::new(tools.inspect.clone(), timeout).prefer_bundled(tools.prefer_bundled)
    }

    pub fn prefer_bundled(mut self, prefer: bool) -> Self {
        self.prefer_bundled = prefer;
        self
    }

    /// Reads the tracks of `path`.
    ///
    /// Fails when the inspect invocation does not succeed; the error carries
    /// the runner's diagnostic (stderr, timeout or cancellation).
    pub async fn read(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ContainerHandle, ReadError> {
        info!(file = ?path, "Reading tracks");

        let mut runner = ProcessRunner::new(self.program.clone())
            .timeout(self.timeout)
            .prefer_bundled(self.prefer_bundled);
        let mut parser = TrackListParser::new();

        let outcome = runner.run_streaming([path], cancel, &mut parser).await;
        runner.dispose();

        outcome.into_result().map_err(|source| ReadError::Process {
            path: path.to_path_buf(),
            source,
        })?;

        let tracks = parser.into_tracks();
        debug!(file = ?path, count = tracks.len(), "Tracks read");

        Ok(ContainerHandle::new(path, tracks))
    }
}
