//! Output destinations for finished records.

use crate::Result;
use crossterm::tty::IsTty;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, OnceLock};

/// A writer that can tell whether it is attached to a terminal.
pub trait Output: Write + Send {
    /// Returns true if the writer is an interactive character device.
    fn is_terminal(&self) -> bool {
        false
    }
}

impl Output for io::Stdout {
    fn is_terminal(&self) -> bool {
        self.is_tty()
    }
}

impl Output for io::Stderr {
    fn is_terminal(&self) -> bool {
        self.is_tty()
    }
}

impl Output for File {
    fn is_terminal(&self) -> bool {
        self.is_tty()
    }
}

impl Output for Vec<u8> {}

/// Wraps any writer as an [`Output`] that is never a terminal.
#[derive(Debug)]
pub struct Detached<W>(pub W);

impl<W: Write> Write for Detached<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write + Send> Output for Detached<W> {}

/// A shared, thread-safe destination for encoded records.
///
/// Each record is written with a single `write_all` while the lock is held,
/// so concurrent records never interleave.
pub struct Sink {
    out: Mutex<Box<dyn Output>>,
    terminal: OnceLock<bool>,
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("terminal", &self.terminal.get())
            .finish_non_exhaustive()
    }
}

impl Sink {
    /// Creates a sink over any [`Output`].
    #[must_use]
    pub fn new(out: impl Output + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
            terminal: OnceLock::new(),
        }
    }

    /// Creates a sink over any writer; it never reports a terminal.
    #[must_use]
    pub fn from_writer(w: impl Write + Send + 'static) -> Self {
        Self::new(Detached(w))
    }

    /// Standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Overrides terminal detection.
    #[must_use]
    pub fn assume_terminal(self, terminal: bool) -> Self {
        // A fresh sink has no cached answer yet, so this always lands.
        let _ = self.terminal.set(terminal);
        self
    }

    /// Returns whether the underlying writer is a terminal.
    ///
    /// The check runs once, on first use, and is cached.
    pub fn is_terminal(&self) -> bool {
        *self.terminal.get_or_init(|| {
            let terminal = self.lock().is_terminal();
            tracing::trace!(terminal, "sink terminal check");
            terminal
        })
    }

    /// Writes one finished record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`](crate::Error::Write) if the writer fails.
    /// Failures are never retried.
    pub fn write_record(&self, record: &[u8]) -> Result<()> {
        let mut out = self.lock();
        out.write_all(record)?;
        out.flush()?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Output>> {
        self.out.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Sink {
    fn default() -> Self {
        Self::stderr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("simulated failure"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("simulated failure"))
        }
    }

    #[test]
    fn test_detached_writer_is_not_terminal() {
        let sink = Sink::from_writer(Vec::new());
        assert!(!sink.is_terminal());
    }

    #[test]
    fn test_assume_terminal_wins() {
        let sink = Sink::from_writer(Vec::new()).assume_terminal(true);
        assert!(sink.is_terminal());
    }

    #[test]
    fn test_write_failure_is_surfaced() {
        let sink = Sink::from_writer(FailingWriter);
        let err = sink.write_record(b"x").unwrap_err();
        assert!(err.to_string().contains("simulated failure"));
    }
}
