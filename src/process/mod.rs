//! External tool invocation.

pub mod completion;
pub mod locate;
pub mod runner;

pub use completion::Completion;
pub use runner::{ProcessRunner, RunOutcome, RunStatus};

/// Receives the stdout lines of one invocation, in order.
///
/// Lines are delivered from the task driving the process, never concurrently,
/// so implementations must return quickly. [`LineSink::on_end`] is called once
/// when stdout closes naturally; it is not called after a timeout or a
/// cancellation.
pub trait LineSink {
    fn on_line(&mut self, line: &str);

    fn on_end(&mut self) {}
}

impl<F> LineSink for F
where
    F: FnMut(Option<&str>),
{
    fn on_line(&mut self, line: &str) {
        self(Some(line));
    }

    fn on_end(&mut self) {
        self(None);
    }
}
