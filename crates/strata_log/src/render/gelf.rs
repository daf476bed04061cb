//! GELF renderer: one JSON object per record.

use crate::Result;
use crate::gelf::{GelfBuffer, IntegerPolicy};
use crate::handler::{Handler, Record};
use crate::level::Level;
use crate::scope::{Scope, Visit, join_message};
use crate::sink::Sink;
use crate::value::Attr;
use std::ffi::OsString;
use std::io;
use std::sync::OnceLock;

const FALLBACK_HOSTNAME: &str = "localhost";

/// Runs `lookup`, falling back to `localhost` when it fails or yields an
/// empty name.
fn resolve_hostname(lookup: impl FnOnce() -> io::Result<OsString>) -> String {
    match lookup() {
        Ok(name) if !name.is_empty() => name.to_string_lossy().into_owned(),
        Ok(_) => {
            tracing::debug!("hostname lookup returned an empty name, using {FALLBACK_HOSTNAME}");
            FALLBACK_HOSTNAME.to_string()
        }
        Err(err) => {
            tracing::debug!(error = %err, "hostname lookup failed, using {FALLBACK_HOSTNAME}");
            FALLBACK_HOSTNAME.to_string()
        }
    }
}

/// Options for [`GelfRenderer`].
#[derive(Debug, Clone)]
pub struct GelfOptions {
    /// Minimum level that is rendered.
    pub level: Level,
    /// Value of the `host` field. `None` resolves the machine name.
    pub hostname: Option<String>,
    /// Terminate each record with `\n`.
    pub newline: bool,
    /// Encoding of unsigned integers.
    pub integer_policy: IntegerPolicy,
}

impl Default for GelfOptions {
    fn default() -> Self {
        Self {
            level: Level::Info,
            hostname: None,
            newline: true,
            integer_policy: IntegerPolicy::default(),
        }
    }
}

/// Per-scope state: the scope's fields already encoded.
#[derive(Debug, Clone)]
pub struct PreparedGelf {
    base: GelfBuffer,
    prefix: String,
    group_path: String,
}

impl PreparedGelf {
    /// The precomputed payload prefix shared by every record of the scope.
    #[must_use]
    pub fn base(&self) -> &GelfBuffer {
        &self.base
    }

    /// The concatenated message prefix of the scope.
    #[must_use]
    pub fn message_prefix(&self) -> &str {
        &self.prefix
    }
}

struct BaseBuilder<'a> {
    buf: &'a mut GelfBuffer,
    prefix: String,
}

impl Visit for BaseBuilder<'_> {
    fn prefix(&mut self, fragment: &str) {
        self.prefix.push_str(fragment);
    }

    fn attr(&mut self, group_path: &str, attr: &Attr) {
        self.buf.add_prefixed(group_path, &attr.key, &attr.value);
    }
}

/// Renders records as newline-delimited GELF 1.1.
///
/// ```rust
/// use strata_log::{GelfOptions, GelfRenderer, Level, Record, Scope};
///
/// let renderer = GelfRenderer::new(
///     GelfOptions {
///         hostname: Some("web-1".into()),
///         ..GelfOptions::default()
///     },
///     strata_log::Sink::from_writer(std::io::sink()),
/// );
/// let scope = Scope::root().with_prefix("[req]").with_field("user", "alice");
/// let prepared = renderer.prepare_scope(&scope);
/// let out = renderer.render(&prepared, &Record::new(Level::Info, "hello", &[]));
/// let line = String::from_utf8(out).unwrap();
/// assert!(line.contains(r#""_user":"alice""#));
/// assert!(line.contains(r#""short_message":"[req] hello""#));
/// ```
#[derive(Debug)]
pub struct GelfRenderer {
    options: GelfOptions,
    hostname: OnceLock<String>,
    sink: Sink,
}

impl GelfRenderer {
    /// Creates a renderer writing to `sink`.
    #[must_use]
    pub fn new(options: GelfOptions, sink: Sink) -> Self {
        Self {
            options,
            hostname: OnceLock::new(),
            sink,
        }
    }

    /// Returns the options in effect.
    #[must_use]
    pub fn options(&self) -> &GelfOptions {
        &self.options
    }

    /// Returns the `host` value, resolving it on first use.
    pub fn hostname(&self) -> &str {
        self.hostname.get_or_init(|| {
            if let Some(host) = self.options.hostname.as_deref().filter(|h| !h.is_empty()) {
                return host.to_string();
            }
            resolve_hostname(hostname::get)
        })
    }

    /// Encodes the fields of `scope` once.
    #[must_use]
    pub fn prepare_scope(&self, scope: &Scope) -> PreparedGelf {
        let mut base = GelfBuffer::new().integer_policy(self.options.integer_policy);
        let mut builder = BaseBuilder {
            buf: &mut base,
            prefix: String::new(),
        };
        let group_path = scope.visit(&mut builder);
        let prefix = builder.prefix;

        PreparedGelf {
            base,
            prefix,
            group_path,
        }
    }

    /// Produces the finished payload for one record.
    #[must_use]
    pub fn render(&self, prepared: &PreparedGelf, record: &Record<'_>) -> Vec<u8> {
        let mut buf = prepared.base.clone();
        let mut prefix = None::<String>;

        for attr in record.attrs {
            if attr.is_prefix() {
                let p = prefix.get_or_insert_with(|| prepared.prefix.clone());
                p.push_str(&attr.value.to_string());
                continue;
            }
            buf.add_prefixed(&prepared.group_path, &attr.key, &attr.value);
        }

        buf.host(self.hostname());
        buf.timestamp(&record.time);
        buf.level(record.level.priority());
        let prefix = prefix.as_deref().unwrap_or(&prepared.prefix);
        buf.message(&join_message(prefix, record.message));
        buf.add("level_name", &record.level.as_upper_str().into());

        buf.complete(self.options.newline)
    }
}

impl Handler for GelfRenderer {
    type Prepared = PreparedGelf;

    fn enabled(&self, level: Level) -> bool {
        level >= self.options.level
    }

    fn prepare(&self, scope: &Scope) -> PreparedGelf {
        self.prepare_scope(scope)
    }

    fn handle(&self, prepared: &PreparedGelf, record: &Record<'_>) -> Result<()> {
        let payload = self.render(prepared, record);
        self.sink.write_record(&payload).inspect_err(|err| {
            tracing::debug!(error = %err, "gelf record write failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn renderer() -> GelfRenderer {
        GelfRenderer::new(
            GelfOptions {
                hostname: Some("test-host".into()),
                newline: false,
                ..GelfOptions::default()
            },
            Sink::from_writer(io::sink()),
        )
    }

    fn render(renderer: &GelfRenderer, scope: &Scope, record: &Record<'_>) -> String {
        let prepared = renderer.prepare_scope(scope);
        String::from_utf8(renderer.render(&prepared, record)).unwrap()
    }

    #[test]
    fn test_fixed_field_order() {
        let r = renderer();
        let time = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
        let scope = Scope::root().with_field("k", "v");
        let out = render(&r, &scope, &Record::at(time, Level::Warn, "careful", &[]));
        assert_eq!(
            out,
            concat!(
                r#"{"version":"1.1","_k":"v","host":"test-host","timestamp":1700000000.5,"#,
                r#""level":4,"short_message":"careful","_level_name":"WARN"}"#
            )
        );
    }

    #[test]
    fn test_record_attrs_follow_group_path() {
        let r = renderer();
        let scope = Scope::root().with_group("g1").with_field("a", 1);
        let attrs = [Attr::new("b", 2)];
        let out = render(&r, &scope, &Record::new(Level::Info, "m", &attrs));
        assert!(out.contains(r#""_g1.a":1,"_g1.b":2"#), "{out}");
    }

    #[test]
    fn test_call_site_prefix_joins_message() {
        let r = renderer();
        let scope = Scope::root().with_prefix("[a]");
        let attrs = [Attr::prefix("[b]")];
        let out = render(&r, &scope, &Record::new(Level::Info, "m", &attrs));
        assert!(out.contains(r#""short_message":"[a][b] m""#), "{out}");
        assert!(!out.contains(crate::PREFIX_KEY));
    }

    #[test]
    fn test_enabled_respects_threshold() {
        let r = renderer();
        assert!(!r.enabled(Level::Debug));
        assert!(r.enabled(Level::Info));
        assert!(r.enabled(Level::Panic));
    }

    #[test]
    fn test_hostname_is_resolved_once() {
        let r = GelfRenderer::new(GelfOptions::default(), Sink::from_writer(io::sink()));
        let first = r.hostname().to_string();
        assert!(!first.is_empty());
        assert!(std::ptr::eq(r.hostname(), r.hostname()));
    }

    #[test]
    fn test_hostname_lookup_failure_falls_back() {
        let host = resolve_hostname(|| Err(io::Error::other("no uts namespace")));
        assert_eq!(host, "localhost");
    }

    #[test]
    fn test_empty_hostname_falls_back() {
        assert_eq!(resolve_hostname(|| Ok(OsString::new())), "localhost");
        assert_eq!(resolve_hostname(|| Ok(OsString::from("web-1"))), "web-1");
    }

    #[test]
    fn test_prefix_inside_group_is_not_a_field() {
        let r = renderer();
        let scope = Scope::root().with_attrs(vec![Attr::group(
            "g",
            vec![Attr::prefix("[x]"), Attr::new("k", 1)],
        )]);
        let attrs = [Attr::group("rec", vec![Attr::prefix("[y]")])];
        let out = render(&r, &scope, &Record::new(Level::Info, "m", &attrs));
        assert!(!out.contains(crate::PREFIX_KEY), "{out}");
        assert!(out.contains(r#""_g.k":1"#), "{out}");
        assert!(out.contains(r#""short_message":"m""#), "{out}");
    }
}
