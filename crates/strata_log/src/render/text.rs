//! Human-readable renderer.
//!
//! Two layouts share one field table:
//!
//! - plain: `index=1 level=info time="..." msg=hello k=v`, for pipes and files,
//! - formatted: `[0004]  INFO hello k=v`, optionally colored, for terminals.

use crate::color::{ColorScheme, CompiledColorScheme};
use crate::escape::quote;
use crate::handler::{Handler, Record};
use crate::level::Level;
use crate::scope::{FieldTable, Scope, Visit, join_message};
use crate::sink::Sink;
use crate::value::{Attr, Value};
use crate::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Field names owned by the plain layout. User fields with these names are
/// renamed to `fields.<name>`.
const RESERVED_KEYS: [&str; 3] = ["time", "msg", "level"];

/// Options for [`TextRenderer`].
#[derive(Debug, Clone)]
pub struct TextOptions {
    /// Minimum level that is rendered.
    pub level: Level,
    /// Color output even when the sink is not a terminal.
    pub force_colors: bool,
    /// Never color output.
    pub disable_colors: bool,
    /// Use the formatted layout even when the sink is not a terminal.
    pub force_formatting: bool,
    pub disable_timestamp: bool,
    /// Keep level labels lowercase in the formatted layout.
    pub disable_uppercase: bool,
    /// Print the record time instead of seconds since start in the
    /// formatted layout.
    pub full_timestamp: bool,
    /// A chrono strftime format. `None` means RFC 3339.
    pub timestamp_format: Option<String>,
    pub disable_sorting: bool,
    /// Quote empty string values.
    pub quote_empty_fields: bool,
    /// Wraps quoted values. Unless it is `"`, occurrences inside the value
    /// are escaped with a backslash.
    pub quote_character: String,
    /// Left-justify the message to this many columns in the formatted layout.
    pub space_padding: usize,
    /// Pattern whose match at the start of the message is painted with the
    /// prefix color, e.g. `^(\[.*?\])\s`.
    pub prefix_pattern: Option<Regex>,
    /// Template for non-text values in the formatted layout; `{}` is
    /// replaced by the value.
    pub value_template: String,
    /// `None` uses the default scheme.
    pub color_scheme: Option<ColorScheme>,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            level: Level::Info,
            force_colors: false,
            disable_colors: false,
            force_formatting: false,
            disable_timestamp: false,
            disable_uppercase: false,
            full_timestamp: false,
            timestamp_format: None,
            disable_sorting: false,
            quote_empty_fields: false,
            quote_character: "\"".to_string(),
            space_padding: 0,
            prefix_pattern: None,
            value_template: "{}".to_string(),
            color_scheme: None,
        }
    }
}

/// Per-scope state: the scope's fields, keyed and ordered.
#[derive(Debug, Clone)]
pub struct PreparedText {
    fields: FieldTable,
    prefix: String,
    group_path: String,
}

struct TableBuilder<'a> {
    table: &'a mut FieldTable,
    prefix: String,
}

impl Visit for TableBuilder<'_> {
    fn prefix(&mut self, fragment: &str) {
        self.prefix.push_str(fragment);
    }

    fn attr(&mut self, group_path: &str, attr: &Attr) {
        self.table.insert_attr(group_path, attr);
    }
}

/// Renders records as `key=value` lines or colored terminal lines.
#[derive(Debug)]
pub struct TextRenderer {
    options: TextOptions,
    scheme: Option<CompiledColorScheme>,
    index: AtomicU64,
    started: Instant,
    sink: Sink,
}

impl TextRenderer {
    /// Creates a renderer writing to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Style`] if the color scheme has an invalid entry and
    /// [`Error::TimestampFormat`] if the timestamp format cannot be parsed.
    pub fn new(options: TextOptions, sink: Sink) -> Result<Self> {
        if let Some(format) = &options.timestamp_format {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(Error::TimestampFormat(format.clone()));
            }
        }
        let scheme = options
            .color_scheme
            .as_ref()
            .map(ColorScheme::compile)
            .transpose()?;

        Ok(Self {
            options,
            scheme,
            index: AtomicU64::new(0),
            started: Instant::now(),
            sink,
        })
    }

    /// Returns the options in effect.
    #[must_use]
    pub fn options(&self) -> &TextOptions {
        &self.options
    }

    /// Returns true if records use the formatted layout.
    pub fn is_formatted(&self) -> bool {
        self.options.force_formatting || self.sink.is_terminal()
    }

    /// Returns the scheme used by the formatted layout.
    pub fn color_scheme(&self) -> &CompiledColorScheme {
        let colored = (self.options.force_colors || self.sink.is_terminal())
            && !self.options.disable_colors;
        if !colored {
            return CompiledColorScheme::no_colors();
        }
        self.scheme
            .as_ref()
            .unwrap_or_else(|| CompiledColorScheme::default_scheme())
    }

    /// Collects the fields of `scope` once.
    #[must_use]
    pub fn prepare_scope(&self, scope: &Scope) -> PreparedText {
        let mut fields = FieldTable::new();
        let mut builder = TableBuilder {
            table: &mut fields,
            prefix: String::new(),
        };
        let group_path = scope.visit(&mut builder);
        let prefix = builder.prefix;

        PreparedText {
            fields,
            prefix,
            group_path,
        }
    }

    /// Produces the finished line for one record, newline included.
    pub fn render(&self, prepared: &PreparedText, record: &Record<'_>) -> String {
        let mut fields = prepared.fields.clone();
        let mut prefix = None::<String>;
        for attr in record.attrs {
            if attr.is_prefix() {
                let p = prefix.get_or_insert_with(|| prepared.prefix.clone());
                p.push_str(&attr.value.to_string());
                continue;
            }
            fields.insert_attr(&prepared.group_path, attr);
        }
        let prefix = prefix.as_deref().unwrap_or(&prepared.prefix);
        let message = join_message(prefix, record.message);

        let formatted = self.is_formatted();
        if !formatted {
            for key in RESERVED_KEYS {
                fields.rename(key, &format!("fields.{key}"));
            }
        }
        if !self.options.disable_sorting {
            fields.sort();
        }

        let mut out = String::with_capacity(128);
        if formatted {
            self.write_formatted(&mut out, record, &message, &fields);
        } else {
            self.write_plain(&mut out, record, &message, &fields);
        }
        out.push('\n');
        out
    }

    fn write_plain(&self, out: &mut String, record: &Record<'_>, message: &str, fields: &FieldTable) {
        let index = self.index.fetch_add(1, Ordering::Relaxed) + 1;
        let _ = write!(out, "index={index}");

        out.push_str(" level=");
        self.write_text(out, record.level.as_str());

        if !self.options.disable_timestamp {
            out.push_str(" time=");
            self.write_text(out, &self.format_time(&record.time));
        }

        if !message.is_empty() {
            out.push_str(" msg=");
            self.write_text(out, message);
        }

        for (key, value) in fields.iter() {
            out.push(' ');
            out.push_str(key);
            out.push('=');
            match value.as_text() {
                Some(text) => self.write_text(out, text),
                None => {
                    let _ = write!(out, "{value}");
                }
            }
        }
    }

    fn write_formatted(
        &self,
        out: &mut String,
        record: &Record<'_>,
        message: &str,
        fields: &FieldTable,
    ) {
        let scheme = self.color_scheme();
        let level_style = scheme.level(record.level);

        if !self.options.disable_timestamp {
            let stamp = if self.options.full_timestamp {
                format!("[{}]", self.format_time(&record.time))
            } else {
                format!("[{:04}]", self.started.elapsed().as_secs())
            };
            scheme.timestamp.paint_into(out, &stamp);
            out.push(' ');
        }

        let label = if self.options.disable_uppercase {
            record.level.as_str()
        } else {
            record.level.as_upper_str()
        };
        level_style.paint_into(out, &format!("{label:>5}"));
        out.push(' ');

        match self.leading_prefix(message) {
            Some(end) => {
                scheme.prefix.paint_into(out, &message[..end]);
                out.push_str(&message[end..]);
            }
            None => out.push_str(message),
        }
        let width = message.chars().count();
        for _ in width..self.options.space_padding {
            out.push(' ');
        }

        for (key, value) in fields.iter() {
            out.push(' ');
            scheme.prefix.paint_into(out, key);
            out.push('=');
            match value.as_text() {
                Some(text) => self.write_text(out, text),
                None => out.push_str(&self.apply_template(value)),
            }
        }
    }

    /// Returns the end of the prefix pattern's match if it starts the message.
    fn leading_prefix(&self, message: &str) -> Option<usize> {
        let found = self.options.prefix_pattern.as_ref()?.find(message)?;
        (found.start() == 0 && found.end() > 0).then_some(found.end())
    }

    fn apply_template(&self, value: &Value) -> String {
        let template = &self.options.value_template;
        match template.find("{}") {
            Some(pos) => format!("{}{value}{}", &template[..pos], &template[pos + 2..]),
            None => template.clone(),
        }
    }

    fn write_text(&self, out: &mut String, text: &str) {
        if !self.needs_quoting(text) {
            out.push_str(text);
            return;
        }
        let quoted = quote(text);
        let body = &quoted[1..quoted.len() - 1];
        let mark = self.options.quote_character.as_str();
        out.push_str(mark);
        if mark.is_empty() || mark == "\"" {
            out.push_str(body);
        } else {
            out.push_str(&body.replace(mark, &format!("\\{mark}")));
        }
        out.push_str(mark);
    }

    fn needs_quoting(&self, text: &str) -> bool {
        if text.is_empty() {
            return self.options.quote_empty_fields;
        }
        !text
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '.')
    }

    fn format_time(&self, time: &DateTime<Utc>) -> String {
        match &self.options.timestamp_format {
            Some(format) => {
                let mut out = String::new();
                // The format was validated in `new`.
                let _ = write!(out, "{}", time.format(format));
                out
            }
            None => crate::value::format_rfc3339(time),
        }
    }
}

impl Handler for TextRenderer {
    type Prepared = PreparedText;

    fn enabled(&self, level: Level) -> bool {
        level >= self.options.level
    }

    fn prepare(&self, scope: &Scope) -> PreparedText {
        self.prepare_scope(scope)
    }

    fn handle(&self, prepared: &PreparedText, record: &Record<'_>) -> Result<()> {
        let line = self.render(prepared, record);
        self.sink.write_record(line.as_bytes()).inspect_err(|err| {
            tracing::debug!(error = %err, "text record write failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io;

    fn plain(options: TextOptions) -> TextRenderer {
        TextRenderer::new(options, Sink::from_writer(io::sink())).unwrap()
    }

    fn time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_needs_quoting() {
        let r = plain(TextOptions::default());
        assert!(!r.needs_quoting("abc-1.2"));
        assert!(r.needs_quoting("a b"));
        assert!(r.needs_quoting("a=b"));
        assert!(r.needs_quoting("é"));
        assert!(!r.needs_quoting(""));

        let r = plain(TextOptions {
            quote_empty_fields: true,
            ..TextOptions::default()
        });
        assert!(r.needs_quoting(""));
    }

    #[test]
    fn test_plain_layout() {
        let r = plain(TextOptions::default());
        let scope = Scope::root().with_field("b", 2).with_field("a", "x y");
        let prepared = r.prepare_scope(&scope);
        let line = r.render(&prepared, &Record::at(time(), Level::Info, "hello", &[]));
        assert_eq!(
            line,
            "index=1 level=info time=\"2024-05-01T08:00:00Z\" msg=hello a=\"x y\" b=2\n"
        );
    }

    #[test]
    fn test_custom_quote_character_and_format() {
        let r = plain(TextOptions {
            quote_character: "'".into(),
            timestamp_format: Some("%Y/%m/%d".into()),
            ..TextOptions::default()
        });
        let prepared = r.prepare_scope(&Scope::root());
        let line = r.render(&prepared, &Record::at(time(), Level::Warn, "a b", &[]));
        assert_eq!(line, "index=1 level=warn time='2024/05/01' msg='a b'\n");
    }

    #[test]
    fn test_custom_quote_character_is_escaped() {
        let r = plain(TextOptions {
            quote_character: "'".into(),
            disable_timestamp: true,
            ..TextOptions::default()
        });
        let prepared = r.prepare_scope(&Scope::root().with_field("who", "it's"));
        let line = r.render(&prepared, &Record::at(time(), Level::Info, "a'b", &[]));
        assert_eq!(line, "index=1 level=info msg='a\\'b' who='it\\'s'\n");
    }

    #[test]
    fn test_prefix_inside_group_is_not_a_field() {
        let r = plain(TextOptions {
            disable_timestamp: true,
            ..TextOptions::default()
        });
        let scope = Scope::root().with_attrs(vec![Attr::group(
            "g",
            vec![Attr::prefix("[x]"), Attr::new("k", 1)],
        )]);
        let prepared = r.prepare_scope(&scope);
        let attrs = [Attr::group("rec", vec![Attr::prefix("[y]")])];
        let line = r.render(&prepared, &Record::at(time(), Level::Info, "m", &attrs));
        assert!(!line.contains(crate::PREFIX_KEY), "{line}");
        assert_eq!(line, "index=1 level=info msg=m g.k=1\n");
    }

    #[test]
    fn test_invalid_timestamp_format_is_rejected() {
        let err = TextRenderer::new(
            TextOptions {
                timestamp_format: Some("%Q".into()),
                ..TextOptions::default()
            },
            Sink::from_writer(io::sink()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::TimestampFormat(_)));
    }

    #[test]
    fn test_template() {
        let r = plain(TextOptions {
            value_template: "<{}>".into(),
            ..TextOptions::default()
        });
        assert_eq!(r.apply_template(&Value::from(3)), "<3>");
    }

    #[test]
    fn test_leading_prefix_only_at_start() {
        let r = plain(TextOptions {
            prefix_pattern: Regex::new(r"\[.*?\]").ok(),
            ..TextOptions::default()
        });
        assert_eq!(r.leading_prefix("[p] msg"), Some(3));
        assert_eq!(r.leading_prefix("msg [p]"), None);
    }
}
