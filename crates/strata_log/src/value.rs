//! Attribute values.
//!
//! Values are classified once, when the attribute is created, so encoders
//! dispatch on a closed set of variants instead of inspecting types at
//! render time.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone};
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

/// Reserved key marking a message-prefix fragment rather than a field.
///
/// An attribute with this key is folded into the message prefix by the
/// scope chain and never reaches an encoder as a field.
pub const PREFIX_KEY: &str = "__strata_prefix__";

/// Separator placed between group names in a flattened key.
pub const GROUP_DELIMITER: char = '.';

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text.
    Str(Cow<'static, str>),
    /// Signed integer of any width.
    Int(i64),
    /// Unsigned integer of any width.
    Uint(u64),
    /// Single-precision float.
    F32(f32),
    /// Double-precision float.
    F64(f64),
    /// Boolean.
    Bool(bool),
    /// Point in time, keeping the caller's UTC offset.
    Time(DateTime<FixedOffset>),
    /// Error message.
    Error(String),
    /// Anything else, already rendered through its `Display` or `Debug` form.
    Other(String),
    /// Nested attributes, flattened as `key.sub` by the encoders.
    Group(Vec<Attr>),
}

impl Value {
    /// Builds an [`Value::Error`] from any error.
    #[must_use]
    pub fn error(err: &(dyn std::error::Error + '_)) -> Self {
        Self::Error(err.to_string())
    }

    /// Builds an [`Value::Other`] from any displayable value.
    #[must_use]
    pub fn display(value: &impl fmt::Display) -> Self {
        Self::Other(value.to_string())
    }

    /// Returns the text of string-like values.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Error(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::F32(n) => write!(f, "{n}"),
            Self::F64(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Time(t) => f.write_str(&format_rfc3339(t)),
            Self::Error(s) | Self::Other(s) => f.write_str(s),
            Self::Group(attrs) => {
                f.write_str("[")?;
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}={}", attr.key, attr.value)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Formats a time as RFC 3339 with whole seconds, using `Z` for UTC.
pub(crate) fn format_rfc3339<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

macro_rules! impl_from {
    ($variant:ident <- $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )+
    };
}

impl_from!(Int <- i8, i16, i32, i64);
impl_from!(Uint <- u8, u16, u32, u64);
impl_from!(Bool <- bool);
impl_from!(F32 <- f32);
impl_from!(F64 <- f64);

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::Uint(v as u64)
    }
}

impl From<&'static str> for Value {
    fn from(v: &'static str) -> Self {
        Self::Str(Cow::Borrowed(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(Cow::Owned(v))
    }
}

impl From<Cow<'static, str>> for Value {
    fn from(v: Cow<'static, str>) -> Self {
        Self::Str(v)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Self::Time(v.fixed_offset())
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Self::Other(format!("{v:?}"))
    }
}

impl From<Vec<Attr>> for Value {
    fn from(v: Vec<Attr>) -> Self {
        Self::Group(v)
    }
}

/// A key/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    /// Field name, without any group path.
    pub key: Cow<'static, str>,
    /// Field value.
    pub value: Value,
}

impl Attr {
    /// Creates an attribute.
    #[must_use]
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a group attribute whose members are namespaced under `key`.
    #[must_use]
    pub fn group(key: impl Into<Cow<'static, str>>, attrs: Vec<Attr>) -> Self {
        Self {
            key: key.into(),
            value: Value::Group(attrs),
        }
    }

    /// Creates a message-prefix fragment.
    #[must_use]
    pub fn prefix(fragment: impl Into<Cow<'static, str>>) -> Self {
        Self {
            key: Cow::Borrowed(PREFIX_KEY),
            value: Value::Str(fragment.into()),
        }
    }

    /// Returns true if this attribute is a message-prefix fragment.
    #[must_use]
    pub fn is_prefix(&self) -> bool {
        self.key == PREFIX_KEY
    }
}

impl<K, V> From<(K, V)> for Attr
where
    K: Into<Cow<'static, str>>,
    V: Into<Value>,
{
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}
