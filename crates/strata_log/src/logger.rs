//! The composition handle applications log through.

use crate::Result;
use crate::handler::{Handler, Record};
use crate::level::Level;
use crate::scope::Scope;
use crate::value::{Attr, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A cheap, cloneable logger bound to one scope.
///
/// Every `with_*` call returns a new logger; the receiver is unchanged, so a
/// base logger can be shared and extended from many threads.
///
/// ```rust
/// use strata_log::{GelfOptions, GelfRenderer, Logger, Sink};
///
/// let renderer = GelfRenderer::new(GelfOptions::default(), Sink::from_writer(std::io::sink()));
/// let logger = Logger::new(renderer)
///     .with_prefix("[worker-1]")
///     .with_field("job", 42);
/// logger.info("started").unwrap();
/// ```
pub struct Logger<H: Handler> {
    handler: Arc<H>,
    scope: Arc<Scope>,
    prepared: Arc<OnceLock<H::Prepared>>,
}

impl<H: Handler> Clone for Logger<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            scope: Arc::clone(&self.scope),
            prepared: Arc::clone(&self.prepared),
        }
    }
}

impl<H: Handler + fmt::Debug> fmt::Debug for Logger<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("handler", &self.handler)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl<H: Handler> Logger<H> {
    /// Creates a logger with an empty scope.
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self::from_parts(Arc::new(handler), Scope::root())
    }

    /// Creates a logger from a shared handler and an existing scope.
    #[must_use]
    pub fn from_parts(handler: Arc<H>, scope: Arc<Scope>) -> Self {
        Self {
            handler,
            scope,
            prepared: Arc::new(OnceLock::new()),
        }
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns the scope.
    #[must_use]
    pub fn scope(&self) -> &Arc<Scope> {
        &self.scope
    }

    fn derive(&self, scope: Arc<Scope>) -> Self {
        if Arc::ptr_eq(&scope, &self.scope) {
            return self.clone();
        }
        Self::from_parts(Arc::clone(&self.handler), scope)
    }

    /// Returns a logger with one more field.
    #[must_use]
    pub fn with_field(&self, key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.derive(self.scope.with_field(key, value))
    }

    /// Returns a logger with several more fields, in iteration order.
    #[must_use]
    pub fn with_fields<I, A>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Attr>,
    {
        self.with_attrs(fields.into_iter().map(Into::into).collect())
    }

    /// Returns a logger carrying `attrs`.
    #[must_use]
    pub fn with_attrs(&self, attrs: Vec<Attr>) -> Self {
        self.derive(self.scope.with_attrs(attrs))
    }

    /// Returns a logger with an `error` field.
    #[must_use]
    pub fn with_error(&self, err: &(dyn std::error::Error + '_)) -> Self {
        self.with_field("error", Value::error(err))
    }

    /// Returns a logger whose messages are prefixed with `fragment`.
    #[must_use]
    pub fn with_prefix(&self, fragment: impl Into<String>) -> Self {
        self.derive(self.scope.with_prefix(fragment))
    }

    /// Returns a logger whose later fields are namespaced under `name`.
    #[must_use]
    pub fn with_group(&self, name: impl Into<String>) -> Self {
        self.derive(self.scope.with_group(name))
    }

    /// Returns true if `level` would be rendered.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        self.handler.enabled(level)
    }

    /// Logs `message` with call-site attributes.
    ///
    /// # Errors
    ///
    /// Returns the sink error if the record could not be written.
    pub fn log(&self, level: Level, message: &str, attrs: &[Attr]) -> Result<()> {
        if !self.handler.enabled(level) {
            return Ok(());
        }
        self.log_record(&Record::new(level, message, attrs))
    }

    /// Logs a prebuilt record, bypassing the level check.
    ///
    /// # Errors
    ///
    /// Returns the sink error if the record could not be written.
    pub fn log_record(&self, record: &Record<'_>) -> Result<()> {
        let prepared = self
            .prepared
            .get_or_init(|| self.handler.prepare(&self.scope));
        self.handler.handle(prepared, record)
    }

    /// Logs at debug level.
    ///
    /// # Errors
    ///
    /// Returns the sink error if the record could not be written.
    pub fn debug(&self, message: &str) -> Result<()> {
        self.log(Level::Debug, message, &[])
    }

    /// Logs at info level.
    ///
    /// # Errors
    ///
    /// Returns the sink error if the record could not be written.
    pub fn info(&self, message: &str) -> Result<()> {
        self.log(Level::Info, message, &[])
    }

    /// Logs at warn level.
    ///
    /// # Errors
    ///
    /// Returns the sink error if the record could not be written.
    pub fn warn(&self, message: &str) -> Result<()> {
        self.log(Level::Warn, message, &[])
    }

    /// Logs at error level.
    ///
    /// # Errors
    ///
    /// Returns the sink error if the record could not be written.
    pub fn error(&self, message: &str) -> Result<()> {
        self.log(Level::Error, message, &[])
    }

    /// Logs at fatal level. The process keeps running; exiting is up to
    /// the caller.
    ///
    /// # Errors
    ///
    /// Returns the sink error if the record could not be written.
    pub fn fatal(&self, message: &str) -> Result<()> {
        self.log(Level::Fatal, message, &[])
    }

    /// Logs at panic level. Nothing panics; unwinding is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns the sink error if the record could not be written.
    pub fn panic(&self, message: &str) -> Result<()> {
        self.log(Level::Panic, message, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records prepare calls and rendered lines.
    #[derive(Default)]
    struct Recorder {
        prepares: AtomicUsize,
        lines: Mutex<Vec<String>>,
    }

    impl Handler for Recorder {
        type Prepared = String;

        fn enabled(&self, level: Level) -> bool {
            level >= Level::Info
        }

        fn prepare(&self, scope: &Scope) -> String {
            self.prepares.fetch_add(1, Ordering::SeqCst);
            scope.message_prefix()
        }

        fn handle(&self, prepared: &String, record: &Record<'_>) -> Result<()> {
            self.lines
                .lock()
                .unwrap()
                .push(format!("{prepared}|{}|{}", record.level, record.message));
            Ok(())
        }
    }

    #[test]
    fn test_prepare_runs_once_per_scope() {
        let logger = Logger::new(Recorder::default()).with_prefix("[p]");
        logger.info("a").unwrap();
        logger.clone().warn("b").unwrap();
        assert_eq!(logger.handler().prepares.load(Ordering::SeqCst), 1);

        let child = logger.with_field("k", 1);
        child.info("c").unwrap();
        assert_eq!(logger.handler().prepares.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_disabled_levels_are_skipped() {
        let logger = Logger::new(Recorder::default());
        logger.debug("hidden").unwrap();
        logger.panic("shown").unwrap();
        let lines = logger.handler().lines.lock().unwrap();
        assert_eq!(*lines, vec!["|panic|shown".to_string()]);
    }

    #[test]
    fn test_empty_derivation_reuses_prepared_state() {
        let logger = Logger::new(Recorder::default());
        logger.info("a").unwrap();
        logger.with_attrs(Vec::new()).info("b").unwrap();
        logger.with_group("").info("c").unwrap();
        assert_eq!(logger.handler().prepares.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_with_error_adds_error_field() {
        let err = std::io::Error::other("boom");
        let logger = Logger::new(Recorder::default()).with_error(&err);
        let scope = logger.scope();
        let mut table = crate::scope::FieldTable::new();
        scope.visit(&mut table);
        assert_eq!(table.get("error"), Some(&Value::Error("boom".into())));
    }
}
