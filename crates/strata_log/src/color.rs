//! Color schemes for the text renderer.
//!
//! A [`ColorScheme`] names one [`tincture`] style spec per role. Compiling it
//! parses every spec once; the resulting [`CompiledColorScheme`] is
//! read-only and shared for the lifetime of the renderer.

use crate::level::Level;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tincture::{Style, StyleError};

static DEFAULT_COMPILED: LazyLock<CompiledColorScheme> = LazyLock::new(|| {
    ColorScheme::default().compile().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "default color scheme failed to compile, colors disabled");
        NO_COLORS.clone()
    })
});

static NO_COLORS: LazyLock<CompiledColorScheme> = LazyLock::new(|| CompiledColorScheme {
    info: Style::plain(),
    warn: Style::plain(),
    error: Style::plain(),
    fatal: Style::plain(),
    panic: Style::plain(),
    debug: Style::plain(),
    prefix: Style::plain(),
    timestamp: Style::plain(),
});

/// Style specs for each rendering role.
///
/// Empty specs fall back to the default scheme's entry when compiled.
///
/// ```rust
/// use strata_log::ColorScheme;
///
/// let scheme = ColorScheme {
///     info: "green+b".into(),
///     ..ColorScheme::empty()
/// };
/// let compiled = scheme.compile().unwrap();
/// assert_eq!(compiled.info.paint("ok"), "\x1b[1;32mok\x1b[0m");
/// // Unset roles use the defaults.
/// assert_eq!(compiled.warn.spec(), "yellow");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub info: String,
    pub warn: String,
    pub error: String,
    pub fatal: String,
    pub panic: String,
    pub debug: String,
    /// Message prefix and field keys.
    pub prefix: String,
    pub timestamp: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            info: "green".to_string(),
            warn: "yellow".to_string(),
            error: "red".to_string(),
            fatal: "red".to_string(),
            panic: "red".to_string(),
            debug: "blue".to_string(),
            prefix: "cyan".to_string(),
            timestamp: "black+h".to_string(),
        }
    }
}

impl ColorScheme {
    /// A scheme with every role unset, so that compiling it yields the
    /// defaults.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            info: String::new(),
            warn: String::new(),
            error: String::new(),
            fatal: String::new(),
            panic: String::new(),
            debug: String::new(),
            prefix: String::new(),
            timestamp: String::new(),
        }
    }

    /// Parses every role, substituting the default spec for empty ones.
    ///
    /// # Errors
    ///
    /// Returns the first [`StyleError`] encountered.
    pub fn compile(&self) -> Result<CompiledColorScheme, StyleError> {
        let defaults = Self::default();
        let pick = |main: &str, fallback: &str| {
            if main.trim().is_empty() {
                Style::parse(fallback)
            } else {
                Style::parse(main)
            }
        };

        Ok(CompiledColorScheme {
            info: pick(&self.info, &defaults.info)?,
            warn: pick(&self.warn, &defaults.warn)?,
            error: pick(&self.error, &defaults.error)?,
            fatal: pick(&self.fatal, &defaults.fatal)?,
            panic: pick(&self.panic, &defaults.panic)?,
            debug: pick(&self.debug, &defaults.debug)?,
            prefix: pick(&self.prefix, &defaults.prefix)?,
            timestamp: pick(&self.timestamp, &defaults.timestamp)?,
        })
    }
}

/// A compiled scheme: one ready-to-use painter per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledColorScheme {
    pub info: Style,
    pub warn: Style,
    pub error: Style,
    pub fatal: Style,
    pub panic: Style,
    pub debug: Style,
    pub prefix: Style,
    pub timestamp: Style,
}

impl CompiledColorScheme {
    /// The compiled default scheme, shared process-wide.
    #[must_use]
    pub fn default_scheme() -> &'static Self {
        &DEFAULT_COMPILED
    }

    /// The scheme that paints nothing, shared process-wide.
    #[must_use]
    pub fn no_colors() -> &'static Self {
        &NO_COLORS
    }

    /// Returns the style used for a level label.
    #[must_use]
    pub fn level(&self, level: Level) -> &Style {
        match level {
            Level::Debug => &self.debug,
            Level::Info => &self.info,
            Level::Warn => &self.warn,
            Level::Error => &self.error,
            Level::Fatal => &self.fatal,
            Level::Panic => &self.panic,
        }
    }
}
