//! Streaming GELF payload builder.
//!
//! Fields are appended in call order and never deduplicated, so the same
//! key may legally appear twice in one payload.
//!
//! ```rust
//! use strata_log::{GelfBuffer, Value};
//!
//! let mut gelf = GelfBuffer::new();
//! gelf.host("web-1");
//! gelf.add("user", &Value::from("alice"));
//! gelf.add("id", &Value::from(42)); // reserved, never written
//! assert_eq!(
//!     gelf.complete(false),
//!     br#"{"version":"1.1","host":"web-1","_user":"alice"}"#
//! );
//! ```

use crate::escape::{write_escaped, write_quoted};
use crate::level::Priority;
use crate::value::{GROUP_DELIMITER, Value, format_rfc3339};
use chrono::{DateTime, TimeZone};
use std::io::Write;

const HEADER: &[u8] = br#"{"version":"1.1""#;
const DEFAULT_CAPACITY: usize = 256;

/// How unsigned integers are written.
///
/// Some GELF backends store numbers as signed 64-bit or double values and
/// reject larger unsigned integers, hence the float fallback by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegerPolicy {
    /// Unsigned integers are written as shortest round-trip floating-point
    /// literals. Values up to 2^53 print exactly; larger ones lose precision.
    #[default]
    Graylog,
    /// Unsigned integers are written as exact bare literals.
    Exact,
}

/// An append-only buffer holding one GELF record under construction.
///
/// `Clone` copies the bytes written so far, which lets a renderer build the
/// fields shared by many records once and duplicate them per record.
#[derive(Debug, Clone)]
pub struct GelfBuffer {
    buf: Vec<u8>,
    integers: IntegerPolicy,
}

impl Default for GelfBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl GelfBuffer {
    /// Creates a buffer with the `{"version":"1.1"` header already written.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a buffer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity.max(HEADER.len() + 2));
        buf.extend_from_slice(HEADER);
        Self {
            buf,
            integers: IntegerPolicy::default(),
        }
    }

    /// Sets how unsigned integers are encoded by later [`add`](Self::add) calls.
    #[must_use]
    pub fn integer_policy(mut self, policy: IntegerPolicy) -> Self {
        self.integers = policy;
        self
    }

    /// Appends the `host` field.
    pub fn host(&mut self, host: &str) {
        self.key("host");
        write_quoted(&mut self.buf, host.as_bytes());
    }

    /// Appends the numeric `level` field.
    pub fn level(&mut self, priority: Priority) {
        self.key("level");
        self.write_display(priority.code());
    }

    /// Appends the `timestamp` field as fractional Unix seconds.
    pub fn timestamp<Tz: TimeZone>(&mut self, t: &DateTime<Tz>) {
        self.key("timestamp");
        let secs = match t.timestamp_nanos_opt() {
            Some(nanos) => nanos as f64 / 1e9,
            None => t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) / 1e9,
        };
        self.write_f64(secs);
    }

    /// Appends `short_message`, plus `full_message` when `message` spans
    /// several lines.
    pub fn message(&mut self, message: &str) {
        match message.find('\n') {
            Some(i) if i > 0 => {
                self.key("short_message");
                write_quoted(&mut self.buf, message[..i].as_bytes());
                self.key("full_message");
                write_quoted(&mut self.buf, message.as_bytes());
            }
            _ => {
                self.key("short_message");
                write_quoted(&mut self.buf, message.as_bytes());
            }
        }
    }

    /// Appends a user field as `_key`.
    ///
    /// The keys `id` and `_id` are reserved by GELF ingesters and are
    /// silently dropped. Group values are flattened to `_key.sub` fields;
    /// prefix fragments inside a group are not fields and are skipped.
    pub fn add(&mut self, key: &str, value: &Value) {
        self.add_prefixed("", key, value);
    }

    /// Appends a user field whose full name is `prefix` followed by `key`.
    ///
    /// `prefix` is a group path such as `"g1.g2."`.
    pub fn add_prefixed(&mut self, prefix: &str, key: &str, value: &Value) {
        if prefix.is_empty() && (key == "id" || key == "_id") {
            return;
        }

        if let Value::Group(attrs) = value {
            let mut nested = String::with_capacity(prefix.len() + key.len() + 1);
            nested.push_str(prefix);
            if !key.is_empty() {
                nested.push_str(key);
                nested.push(GROUP_DELIMITER);
            }
            for attr in attrs.iter().filter(|a| !a.is_prefix()) {
                self.add_prefixed(&nested, &attr.key, &attr.value);
            }
            return;
        }

        self.buf.extend_from_slice(b",\"_");
        write_escaped(&mut self.buf, prefix.as_bytes());
        write_escaped(&mut self.buf, key.as_bytes());
        self.buf.extend_from_slice(b"\":");
        self.value(value);
    }

    /// Closes the record, optionally newline-terminated, and returns it.
    #[must_use]
    pub fn complete(mut self, newline: bool) -> Vec<u8> {
        self.buf.push(b'}');
        if newline {
            self.buf.push(b'\n');
        }
        self.buf
    }

    /// Returns the bytes written so far.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    fn key(&mut self, key: &str) {
        self.buf.push(b',');
        write_quoted(&mut self.buf, key.as_bytes());
        self.buf.push(b':');
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Time(t) => write_quoted(&mut self.buf, format_rfc3339(t).as_bytes()),
            Value::Int(n) => self.write_display(n),
            Value::Uint(n) => match self.integers {
                IntegerPolicy::Graylog => self.write_f64(*n as f64),
                IntegerPolicy::Exact => self.write_display(n),
            },
            Value::F32(n) => {
                if n.is_finite() {
                    self.write_display(n);
                } else {
                    self.write_non_finite(f64::from(*n));
                }
            }
            Value::F64(n) => self.write_f64(*n),
            Value::Bool(true) => self.buf.extend_from_slice(b"\"true\""),
            Value::Bool(false) => self.buf.extend_from_slice(b"\"false\""),
            Value::Str(s) => write_quoted(&mut self.buf, s.as_bytes()),
            Value::Error(s) | Value::Other(s) => write_quoted(&mut self.buf, s.as_bytes()),
            Value::Group(_) => {
                let text = value.to_string();
                write_quoted(&mut self.buf, text.as_bytes());
            }
        }
    }

    fn write_f64(&mut self, n: f64) {
        if n.is_finite() {
            self.write_display(n);
        } else {
            self.write_non_finite(n);
        }
    }

    fn write_non_finite(&mut self, n: f64) {
        let text: &[u8] = if n.is_nan() {
            b"\"NaN\""
        } else if n.is_sign_positive() {
            b"\"+Inf\""
        } else {
            b"\"-Inf\""
        };
        self.buf.extend_from_slice(text);
    }

    fn write_display(&mut self, n: impl std::fmt::Display) {
        // Writing into a Vec cannot fail.
        let _ = write!(self.buf, "{n}");
    }
}
