//! Per-file task fan-out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::media::MetadataReader;
use crate::swap::{SwapReport, SwapSettings, TrackProcessor};

/// Outcome of processing every input file.
#[derive(Debug, Default)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    /// Reports of the files that succeeded, in completion order.
    pub reports: Vec<SwapReport>,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Reads and swaps the tracks of each file, one task per file.
#[derive(Debug)]
pub struct SwapWorker {
    reader: MetadataReader,
    processor: TrackProcessor,
    max_parallel: usize,
}

impl SwapWorker {
    pub fn new(reader: MetadataReader, processor: TrackProcessor, max_parallel: usize) -> Self {
        Self {
            reader,
            processor,
            max_parallel: max_parallel.max(1),
        }
    }

    /// Builds a worker from the configuration.
    pub fn from_config(config: &AppConfig, settings: SwapSettings) -> Self {
        let reader = MetadataReader::from_config(&config.tools, config.timeouts.inspect());
        let processor =
            TrackProcessor::from_config(settings, &config.tools, config.timeouts.remux());
        Self::new(reader, processor, config.max_parallel)
    }

    /// Reads the tracks of `path` then remuxes it. The remux never starts
    /// before the track list is complete.
    pub async fn process_file(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<SwapReport, AppError> {
        let handle = self.reader.read(path, cancel).await?;
        let report = self.processor.put_tracks_first(handle, cancel).await?;
        Ok(report)
    }

    /// Processes every file concurrently and waits for all of them.
    ///
    /// A failing file is logged and counted; it does not stop the others.
    pub async fn process_all(
        self: Arc<Self>,
        files: Vec<PathBuf>,
        cancel: &CancellationToken,
    ) -> Summary {
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut tasks = JoinSet::new();

        for path in files {
            let worker = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let span = info_span!("file", path = %path.display());

            tasks.spawn(
                async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let result = worker.process_file(&path, &cancel).await;
                    (path, result)
                }
                .instrument(span),
            );
        }

        let mut summary = Summary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((path, Ok(report))) => {
                    info!(file = ?path, output = ?report.output, "File done");
                    summary.succeeded += 1;
                    summary.reports.push(report);
                }
                Ok((path, Err(e))) => {
                    error!(file = ?path, error = %e, "File failed");
                    summary.failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "File task panicked");
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
