#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # Strata Log
//!
//! Scoped structured-log composition with two encoders.
//!
//! A [`Logger`] carries an immutable chain of scopes. Each scope adds
//! fields, a group namespace, or a message prefix. At log time the chain is
//! flattened once and handed to a renderer:
//!
//! - [`GelfRenderer`]: newline-delimited GELF 1.1 for log shippers,
//! - [`TextRenderer`]: `key=value` lines, or colored lines on a terminal.
//!
//! ## Example
//!
//! ```rust
//! use strata_log::{Attr, Logger, Sink, TextOptions, TextRenderer};
//!
//! let renderer = TextRenderer::new(TextOptions::default(), Sink::stderr()).unwrap();
//! let logger = Logger::new(renderer)
//!     .with_prefix("[api]")
//!     .with_group("http")
//!     .with_field("method", "GET");
//! logger
//!     .log(strata_log::Level::Info, "request served", &[Attr::new("status", 200)])
//!     .unwrap();
//! ```
//!
//! ## Wire format
//!
//! GELF records keep call order and never deduplicate keys. User fields
//! are written as `_key`; the keys `id` and `_id` are never emitted.

mod color;
pub mod escape;
mod gelf;
mod handler;
mod level;
mod logger;
mod render;
mod scope;
mod sink;
mod value;

use std::io;
use thiserror::Error;

pub use color::{ColorScheme, CompiledColorScheme};
pub use gelf::{GelfBuffer, IntegerPolicy};
pub use handler::{Handler, Record};
pub use level::{Level, ParseLevelError, ParseResult, Priority};
pub use logger::Logger;
pub use render::{GelfOptions, GelfRenderer, PreparedGelf, PreparedText, TextOptions, TextRenderer};
pub use scope::{FieldTable, Scope, Visit, join_message};
pub use sink::{Detached, Output, Sink};
pub use tincture::{Style, StyleError};
pub use value::{Attr, GROUP_DELIMITER, PREFIX_KEY, Value};

/// Errors surfaced by renderers and sinks.
#[derive(Error, Debug)]
pub enum Error {
    /// The sink rejected a finished record.
    #[error("failed to write log record: {0}")]
    Write(#[from] io::Error),

    /// A color scheme entry is not a valid style spec.
    #[error("invalid color scheme: {0}")]
    Style(#[from] StyleError),

    /// The timestamp format contains an unknown specifier.
    #[error("invalid timestamp format: {0:?}")]
    TimestampFormat(String),
}

/// A specialized [`Result`](std::result::Result) for log operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        Attr, ColorScheme, Error, GelfOptions, GelfRenderer, Handler, Level, Logger, Record,
        Result, Scope, Sink, TextOptions, TextRenderer, Value,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::from(io::Error::other("pipe closed"));
        assert_eq!(err.to_string(), "failed to write log record: pipe closed");

        let err = Error::TimestampFormat("%Q".into());
        assert_eq!(err.to_string(), "invalid timestamp format: \"%Q\"");
    }

    #[test]
    fn test_style_error_converts() {
        let err: Error = Style::parse("crimson").unwrap_err().into();
        assert!(matches!(err, Error::Style(_)));
    }
}
