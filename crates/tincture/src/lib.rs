#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # Tincture
//!
//! Compact ANSI style specs for colorizing terminal log lines.
//!
//! A spec is a short string of the form `fg[+attrs][:bg[+attrs]]`:
//!
//! | spec            | meaning                                  |
//! |-----------------|------------------------------------------|
//! | `red`           | red foreground                           |
//! | `black+h`       | bright black (grey) foreground           |
//! | `yellow+bu`     | bold, underlined yellow                  |
//! | `white:blue+h`  | white on bright blue                     |
//! | `208`           | 256-palette index 208                    |
//! | `""`            | no styling at all                        |
//!
//! Attribute letters: `b` bold, `d` dim, `i` italic, `u` underline,
//! `B` blink, `r` reverse, `s` strikethrough, `h` high intensity.
//!
//! ## Example
//!
//! ```rust
//! use tincture::Style;
//!
//! let style = Style::parse("red+b").unwrap();
//! assert_eq!(style.paint("boom"), "\x1b[1;31mboom\x1b[0m");
//!
//! let plain = Style::parse("").unwrap();
//! assert_eq!(plain.paint("boom"), "boom");
//! ```

use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// SGR reset sequence.
pub const RESET: &str = "\x1b[0m";

/// Error returned when a style spec cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    /// The color part is neither a known name nor a palette index.
    #[error("unknown color {0:?}")]
    UnknownColor(String),

    /// The palette index does not fit in `0..=255`.
    #[error("palette index out of range: {0}")]
    IndexOutOfRange(String),

    /// An attribute letter is not recognized.
    #[error("unknown attribute {attr:?} in {spec:?}")]
    UnknownAttribute {
        /// The offending letter.
        attr: char,
        /// The full spec being parsed.
        spec: String,
    },

    /// A background segment carried an attribute other than `h`.
    #[error("background only accepts the 'h' attribute, got {0:?}")]
    BackgroundAttribute(char),
}

/// A terminal color, either one of the eight named colors or a
/// 256-palette index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    /// The terminal's default color.
    Default,
    /// 256-color palette entry.
    Indexed(u8),
}

impl Color {
    fn offset(self) -> Option<u8> {
        match self {
            Self::Black => Some(0),
            Self::Red => Some(1),
            Self::Green => Some(2),
            Self::Yellow => Some(3),
            Self::Blue => Some(4),
            Self::Magenta => Some(5),
            Self::Cyan => Some(6),
            Self::White => Some(7),
            Self::Default | Self::Indexed(_) => None,
        }
    }

    /// Writes the SGR parameter for this color.
    ///
    /// `base` is 30 for foreground and 40 for background.
    fn write_sgr(self, base: u8, bright: bool, out: &mut String) {
        match self {
            Self::Default => push_code(out, base + 9),
            Self::Indexed(n) => {
                push_sep(out);
                out.push_str(&format!("{};5;{n}", base + 8));
            }
            named => {
                let n = named.offset().unwrap_or(0);
                if bright {
                    push_code(out, base + 60 + n);
                } else {
                    push_code(out, base + n);
                }
            }
        }
    }
}

impl FromStr for Color {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "black" => Ok(Self::Black),
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "yellow" => Ok(Self::Yellow),
            "blue" => Ok(Self::Blue),
            "magenta" => Ok(Self::Magenta),
            "cyan" => Ok(Self::Cyan),
            "white" => Ok(Self::White),
            "default" => Ok(Self::Default),
            digits if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => digits
                .parse::<u8>()
                .map(Self::Indexed)
                .map_err(|_| StyleError::IndexOutOfRange(digits.to_string())),
            other => Err(StyleError::UnknownColor(other.to_string())),
        }
    }
}

bitflags! {
    /// Text attributes carried by a style.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attrs: u8 {
        const BOLD = 1 << 0;
        const FAINT = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
        const BLINK = 1 << 4;
        const REVERSE = 1 << 5;
        const STRIKETHROUGH = 1 << 6;
    }
}

impl Attrs {
    const SGR: [(Attrs, u8); 7] = [
        (Attrs::BOLD, 1),
        (Attrs::FAINT, 2),
        (Attrs::ITALIC, 3),
        (Attrs::UNDERLINE, 4),
        (Attrs::BLINK, 5),
        (Attrs::REVERSE, 7),
        (Attrs::STRIKETHROUGH, 9),
    ];
}

/// A compiled style: the opening SGR sequence is built once at parse time
/// so painting is a pair of string pushes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Style {
    spec: String,
    open: String,
    close: &'static str,
}

impl Style {
    /// The identity style. Painting with it returns the input unchanged.
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            spec: String::new(),
            open: String::new(),
            close: "",
        }
    }

    /// Parses a style spec.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError`] for unknown colors, attribute letters or
    /// palette indices outside `0..=255`.
    pub fn parse(spec: &str) -> Result<Self, StyleError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Ok(Self::plain());
        }
        if spec == "reset" {
            return Ok(Self {
                spec: spec.to_string(),
                open: RESET.to_string(),
                close: "",
            });
        }

        let (fg_part, bg_part) = match spec.split_once(':') {
            Some((fg, bg)) => (fg, Some(bg)),
            None => (spec, None),
        };

        let mut open = String::from("\x1b[");
        let params_start = open.len();

        let (fg_name, fg_flags) = split_attrs(fg_part);
        let mut attrs = Attrs::empty();
        let mut fg_bright = false;
        for c in fg_flags.chars() {
            match c {
                'b' => attrs |= Attrs::BOLD,
                'd' => attrs |= Attrs::FAINT,
                'i' => attrs |= Attrs::ITALIC,
                'u' => attrs |= Attrs::UNDERLINE,
                'B' => attrs |= Attrs::BLINK,
                'r' => attrs |= Attrs::REVERSE,
                's' => attrs |= Attrs::STRIKETHROUGH,
                'h' => fg_bright = true,
                other => {
                    return Err(StyleError::UnknownAttribute {
                        attr: other,
                        spec: spec.to_string(),
                    });
                }
            }
        }

        for (flag, code) in Attrs::SGR {
            if attrs.contains(flag) {
                push_code(&mut open, code);
            }
        }
        if !fg_name.is_empty() {
            fg_name.parse::<Color>()?.write_sgr(30, fg_bright, &mut open);
        }

        if let Some(bg_part) = bg_part {
            let (bg_name, bg_flags) = split_attrs(bg_part);
            let mut bg_bright = false;
            for c in bg_flags.chars() {
                match c {
                    'h' => bg_bright = true,
                    other => return Err(StyleError::BackgroundAttribute(other)),
                }
            }
            if !bg_name.is_empty() {
                bg_name.parse::<Color>()?.write_sgr(40, bg_bright, &mut open);
            }
        }

        if open.len() == params_start {
            // Only empty segments such as ":" or "+".
            return Ok(Self {
                spec: spec.to_string(),
                ..Self::plain()
            });
        }
        open.push('m');

        Ok(Self {
            spec: spec.to_string(),
            open,
            close: RESET,
        })
    }

    /// Returns true if painting with this style is a no-op.
    #[must_use]
    pub fn is_plain(&self) -> bool {
        self.open.is_empty()
    }

    /// Returns the spec this style was parsed from.
    #[must_use]
    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// Paints `text`, returning a new string.
    #[must_use]
    pub fn paint(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + self.open.len() + self.close.len());
        self.paint_into(&mut out, text);
        out
    }

    /// Appends `text` painted with this style to `out`.
    ///
    /// Empty text is never wrapped, so blank fields do not leave stray
    /// escape sequences behind.
    pub fn paint_into(&self, out: &mut String, text: &str) {
        if text.is_empty() || self.open.is_empty() {
            out.push_str(text);
            return;
        }
        out.push_str(&self.open);
        out.push_str(text);
        out.push_str(self.close);
    }
}

impl FromStr for Style {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

fn split_attrs(part: &str) -> (&str, &str) {
    part.split_once('+').unwrap_or((part, ""))
}

fn push_sep(out: &mut String) {
    if !out.ends_with('[') {
        out.push(';');
    }
}

fn push_code(out: &mut String, code: u8) {
    push_sep(out);
    out.push_str(&code.to_string());
}
