//! Lifecycle of a single external process invocation.

use std::ffi::{OsStr, OsString};
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::completion::Completion;
use super::locate::resolve_program;
use super::LineSink;
use crate::error::ProcessError;

/// Diagnostic stored when the shared cancellation signal stops a process.
pub const CANCELLED_MESSAGE: &str = "Process was cancelled";

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Exited on its own with status 0.
    Success,
    /// Exited on its own with another status (`None` when killed by a signal).
    NonZeroExit(Option<i32>),
    /// Did not exit before the configured timeout.
    TimedOut(Duration),
    /// Stopped by the cancellation signal.
    Cancelled,
    /// Could not be started.
    SpawnFailed,
    /// The runner had already been used.
    AlreadyRan,
}

/// Result of [`ProcessRunner::run`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub tool: String,
    pub status: RunStatus,
    /// Captured stderr, guarded stdout lines, or a fixed diagnostic.
    pub error: String,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Converts the outcome into a `Result`, carrying the diagnostic on failure.
    pub fn into_result(self) -> Result<(), ProcessError> {
        let tool = self.tool;
        match self.status {
            RunStatus::Success => Ok(()),
            RunStatus::NonZeroExit(code) => Err(ProcessError::NonZeroExit {
                tool,
                code,
                stderr: self.error.trim_end().to_string(),
            }),
            RunStatus::TimedOut(timeout) => Err(ProcessError::Timeout {
                tool,
                timeout,
            }),
            RunStatus::Cancelled => Err(ProcessError::Cancelled { tool }),
            RunStatus::SpawnFailed => Err(ProcessError::SpawnFailed {
                tool,
                message: self.error,
            }),
            RunStatus::AlreadyRan => Err(ProcessError::AlreadyRan { tool }),
        }
    }
}

/// Runs one external program to completion, timeout or cancellation.
///
/// A runner is single-use. Stderr is always captured; stdout is read only
/// when a [`LineSink`] is supplied or an error prefix is registered. The
/// outcome is written to a [`Completion`] cell exactly once, by whichever of
/// natural exit, timeout, cancellation or spawn failure happens first.
///
/// On timeout and on cancellation the child is killed and reaped before the
/// outcome is returned; no output is read after that point.
#[derive(Debug)]
pub struct ProcessRunner {
    tool: String,
    prefer_bundled: bool,
    timeout: Option<Duration>,
    error_prefix: Option<String>,
    child: Option<Child>,
    completion: Completion<RunStatus>,
    errors: String,
    has_ran: bool,
    disposed: bool,
}

impl ProcessRunner {
    /// Creates a runner for `tool`, a bare program name or a path.
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            prefer_bundled: true,
            timeout: None,
            error_prefix: None,
            child: None,
            completion: Completion::new(),
            errors: String::new(),
            has_ran: false,
            disposed: false,
        }
    }

    /// Sets a fixed time budget for the invocation.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether to look for the program next to the running binary before `PATH`.
    pub fn prefer_bundled(mut self, prefer: bool) -> Self {
        self.prefer_bundled = prefer;
        self
    }

    /// Registers a prefix marking error lines the tool prints on stdout.
    pub fn error_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.error_prefix = Some(prefix.into());
        self
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn has_ran(&self) -> bool {
        self.has_ran
    }

    /// Accumulated diagnostic text.
    pub fn error(&self) -> &str {
        &self.errors
    }

    pub fn completion(&self) -> &Completion<RunStatus> {
        &self.completion
    }

    /// Runs the program, discarding stdout unless an error prefix is set.
    pub async fn run<I, S>(&mut self, args: I, cancel: &CancellationToken) -> RunOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args = collect_args(args);
        self.execute(args, cancel, None).await
    }

    /// Runs the program, delivering every stdout line to `sink`.
    pub async fn run_streaming<I, S>(
        &mut self,
        args: I,
        cancel: &CancellationToken,
        sink: &mut (dyn LineSink + Send),
    ) -> RunOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args = collect_args(args);
        self.execute(args, cancel, Some(sink)).await
    }

    async fn execute(
        &mut self,
        args: Vec<OsString>,
        cancel: &CancellationToken,
        mut sink: Option<&mut (dyn LineSink + Send)>,
    ) -> RunOutcome {
        if self.has_ran {
            warn!(tool = %self.tool, "Process runner reused");
            return RunOutcome {
                tool: self.tool.clone(),
                status: RunStatus::AlreadyRan,
                error: String::new(),
            };
        }
        self.has_ran = true;

        if cancel.is_cancelled() {
            self.errors = CANCELLED_MESSAGE.to_string();
            return self.settle(RunStatus::Cancelled);
        }

        let program = resolve_program(&self.tool, self.prefer_bundled);
        let read_stdout = sink.is_some() || self.error_prefix.is_some();

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(if read_stdout { Stdio::piped() } else { Stdio::null() })
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(tool = %self.tool, program = ?program, args = ?args, "Starting process");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(tool = %self.tool, error = %e, "Failed to start process");
                self.errors.push_str(&e.to_string());
                return self.settle(RunStatus::SpawnFailed);
            }
        };

        let mut stdout = child.stdout.take().map(LineReader::new);
        let mut stderr = child.stderr.take().map(LineReader::new);
        let mut stdout_done = stdout.is_none();
        let mut stderr_done = stderr.is_none();
        let mut exit: Option<io::Result<ExitStatus>> = None;

        let timeout = self.timeout;
        let timer = async move {
            match timeout {
                Some(budget) => tokio::time::sleep(budget).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(timer);

        let status = loop {
            if stdout_done && stderr_done {
                if let Some(result) = exit.take() {
                    break self.exit_status(result);
                }
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    terminate(&mut child).await;
                    self.errors = CANCELLED_MESSAGE.to_string();
                    break RunStatus::Cancelled;
                }

                _ = &mut timer => {
                    terminate(&mut child).await;
                    let budget = timeout.unwrap_or_default();
                    self.errors = format!(
                        "Process timed out after {} seconds",
                        budget.as_secs_f64()
                    );
                    break RunStatus::TimedOut(budget);
                }

                line = next_line(&mut stdout), if !stdout_done => match line {
                    Ok(Some(line)) => {
                        self.guard_stdout(&line);
                        if let Some(sink) = sink.as_deref_mut() {
                            sink.on_line(&line);
                        }
                    }
                    Ok(None) => {
                        stdout_done = true;
                        if let Some(sink) = sink.as_deref_mut() {
                            sink.on_end();
                        }
                    }
                    Err(e) => {
                        warn!(tool = %self.tool, error = %e, "Failed to read stdout");
                        stdout_done = true;
                    }
                },

                line = next_line(&mut stderr), if !stderr_done => match line {
                    Ok(Some(line)) => {
                        trace!(tool = %self.tool, line = %line, "stderr");
                        self.push_error(&line);
                    }
                    Ok(None) => stderr_done = true,
                    Err(e) => {
                        warn!(tool = %self.tool, error = %e, "Failed to read stderr");
                        stderr_done = true;
                    }
                },

                result = child.wait(), if exit.is_none() => {
                    exit = Some(result);
                }
            }
        };

        self.child = Some(child);
        self.settle(status)
    }

    /// Copies stdout lines carrying the error prefix into the diagnostic.
    fn guard_stdout(&mut self, line: &str) {
        trace!(tool = %self.tool, line, "stdout");
        let is_error = self
            .error_prefix
            .as_deref()
            .is_some_and(|prefix| line.starts_with(prefix));
        if is_error {
            self.push_error(line);
        }
    }

    fn push_error(&mut self, line: &str) {
        self.errors.push_str(line);
        self.errors.push('\n');
    }

    fn exit_status(&mut self, result: io::Result<ExitStatus>) -> RunStatus {
        match result {
            Ok(status) if status.success() => RunStatus::Success,
            Ok(status) => RunStatus::NonZeroExit(status.code()),
            Err(e) => {
                self.errors.push_str(&e.to_string());
                RunStatus::NonZeroExit(None)
            }
        }
    }

    /// Records the final status and builds the outcome from the stored value.
    fn settle(&self, status: RunStatus) -> RunOutcome {
        if !self.completion.resolve(status.clone()) {
            warn!(tool = %self.tool, ?status, "Process outcome already resolved");
        }
        let status = self.completion.get().cloned().unwrap_or(status);
        debug!(tool = %self.tool, ?status, "Process finished");

        RunOutcome {
            tool: self.tool.clone(),
            status,
            error: self.errors.clone(),
        }
    }

    /// Releases the process handle, killing the child if it is still alive.
    ///
    /// Safe to call any number of times, whether or not the process started.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.start_kill();
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for ProcessRunner {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn collect_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    args.into_iter().map(|a| a.as_ref().to_os_string()).collect()
}

/// Kills the child and waits for it to be reaped.
async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!(error = %e, "Failed to kill process");
    }
}

/// Line reader that tolerates invalid UTF-8 and is safe to poll from `select!`.
struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
        }
    }

    /// Returns the next line without its terminator, or `None` at end of stream.
    ///
    /// Bytes read by a dropped call stay in the buffer and are completed by
    /// the next call.
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        let mut end = self.buf.len();
        if end > 0 && self.buf[end - 1] == b'\n' {
            end -= 1;
        }
        if end > 0 && self.buf[end - 1] == b'\r' {
            end -= 1;
        }

        let line = String::from_utf8_lossy(&self.buf[..end]).into_owned();
        self.buf.clear();
        Ok(Some(line))
    }
}

async fn next_line<R: AsyncRead + Unpin>(
    reader: &mut Option<LineReader<R>>,
) -> io::Result<Option<String>> {
    match reader {
        Some(reader) => reader.next_line().await,
        None => Ok(None),
    }
}
