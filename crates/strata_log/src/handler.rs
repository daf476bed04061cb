//! The seam between a [`Logger`](crate::Logger) and an output format.

use crate::Result;
use crate::level::Level;
use crate::scope::Scope;
use crate::value::Attr;
use chrono::{DateTime, Utc};

/// One log call: a snapshot of time, level, message and call-site
/// attributes.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: &'a str,
    /// Attributes supplied at the call site, namespaced under the
    /// scope's group path.
    pub attrs: &'a [Attr],
}

impl<'a> Record<'a> {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(level: Level, message: &'a str, attrs: &'a [Attr]) -> Self {
        Self::at(Utc::now(), level, message, attrs)
    }

    /// Creates a record with an explicit time.
    #[must_use]
    pub fn at(time: DateTime<Utc>, level: Level, message: &'a str, attrs: &'a [Attr]) -> Self {
        Self {
            time,
            level,
            message,
            attrs,
        }
    }
}

/// Turns records into bytes on a sink.
///
/// `prepare` is called once per derived scope and its result is reused for
/// every record logged through that scope, so per-scope work (flattening,
/// precomputing a base payload) happens once.
pub trait Handler: Send + Sync {
    /// State derived from a scope chain.
    type Prepared: Send + Sync;

    /// Returns true if records at `level` should be handled.
    fn enabled(&self, level: Level) -> bool;

    /// Flattens `scope` into reusable state.
    fn prepare(&self, scope: &Scope) -> Self::Prepared;

    /// Renders and writes one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink write fails.
    fn handle(&self, prepared: &Self::Prepared, record: &Record<'_>) -> Result<()>;
}
