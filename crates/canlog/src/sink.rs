// Copyright (C) 2026  Canlog Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Sinks: where an emitted canonical line goes.
//!
//! A sink receives a severity, a message, and the ordered attribute
//! sequence. Write failures are entirely the sink's concern and are never
//! surfaced to the emitting operation.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, LazyLock, Mutex, PoisonError, RwLock};

use chrono::SecondsFormat;

use crate::config::{LineFormat, LineOutput, SinkConfig};
use crate::value::Attr;

/// Severity of an emitted record.
///
/// Lines derive `Info` or `Error` from their accumulated content; the other
/// levels exist for callers that emit with an explicit severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Diagnostic detail
    Debug,
    /// Normal operation (the derived default)
    Info,
    /// Something suspicious, operation still succeeded
    Warn,
    /// Derived when an `error` attribute is present
    Error,
}

impl Severity {
    /// Lowercase name as written into output
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver for emitted canonical lines.
pub trait Sink: Send + Sync {
    /// Write one record.
    ///
    /// Attributes arrive in insertion order, duplicates included. The
    /// implementation must not panic; failure handling (dropped writes,
    /// full disks) is invisible to the emitting operation.
    fn emit(&self, severity: Severity, message: &str, attrs: &[Attr]);
}

/// Extension methods on sinks.
pub trait SinkExt: Sink + Sized {
    /// Wrap this sink so every emission is prefixed with `preset`
    /// attributes (service name, environment, and the like).
    fn with_attrs(self, preset: Vec<Attr>) -> WithAttrs<Self> {
        WithAttrs {
            inner: self,
            preset,
        }
    }
}

impl<S: Sink + Sized> SinkExt for S {}

/// Sink combinator that prepends preset attributes to every emission.
pub struct WithAttrs<S> {
    inner: S,
    preset: Vec<Attr>,
}

impl<S: Sink> Sink for WithAttrs<S> {
    fn emit(&self, severity: Severity, message: &str, attrs: &[Attr]) {
        let mut merged = Vec::with_capacity(self.preset.len() + attrs.len());
        merged.extend_from_slice(&self.preset);
        merged.extend_from_slice(attrs);
        self.inner.emit(severity, message, &merged);
    }
}

/// Formatting sink writing one line per emission.
///
/// Text output is `key=value` with quoting where needed and preserves
/// duplicate keys. JSON output is one object per line with attribute
/// insertion order preserved; being an object, duplicate keys collapse
/// last-wins at render time (the accumulated sequence itself keeps them).
pub struct FmtSink {
    format: LineFormat,
    timestamps: bool,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl FmtSink {
    /// Create a sink writing to the destination named by the configuration.
    pub fn new(config: SinkConfig) -> Self {
        let writer: Box<dyn Write + Send> = match config.output {
            LineOutput::Stderr => Box::new(io::stderr()),
            LineOutput::Stdout => Box::new(io::stdout()),
        };
        Self::to_writer(config, writer)
    }

    /// Create a sink writing to an arbitrary writer. Used by tests and by
    /// callers logging to files or pipes.
    pub fn to_writer(config: SinkConfig, writer: Box<dyn Write + Send>) -> Self {
        Self {
            format: config.format,
            timestamps: config.timestamps,
            writer: Mutex::new(writer),
        }
    }

    fn render(&self, severity: Severity, message: &str, attrs: &[Attr]) -> String {
        match self.format {
            LineFormat::Text => self.render_text(severity, message, attrs),
            LineFormat::Json => self.render_json(severity, message, attrs),
        }
    }

    fn render_text(&self, severity: Severity, message: &str, attrs: &[Attr]) -> String {
        let mut line = String::new();
        if self.timestamps {
            let ts = chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            line.push_str("ts=");
            line.push_str(&ts);
            line.push(' ');
        }
        line.push_str("level=");
        line.push_str(severity.as_str());
        line.push_str(" msg=");
        line.push_str(&quote(message));
        for attr in attrs {
            line.push(' ');
            line.push_str(&attr.key);
            line.push('=');
            line.push_str(&quote(&attr.value.to_string()));
        }
        line
    }

    fn render_json(&self, severity: Severity, message: &str, attrs: &[Attr]) -> String {
        let mut map = serde_json::Map::new();
        if self.timestamps {
            let ts = chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            map.insert("timestamp".to_string(), serde_json::Value::String(ts));
        }
        map.insert(
            "level".to_string(),
            serde_json::Value::String(severity.as_str().to_string()),
        );
        map.insert(
            "message".to_string(),
            serde_json::Value::String(message.to_string()),
        );
        for attr in attrs {
            map.insert(attr.key.to_string(), attr.value.to_json());
        }
        serde_json::Value::Object(map).to_string()
    }
}

impl Default for FmtSink {
    fn default() -> Self {
        FmtSink::new(SinkConfig::default())
    }
}

impl Sink for FmtSink {
    fn emit(&self, severity: Severity, message: &str, attrs: &[Attr]) {
        let line = self.render(severity, message, attrs);
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{line}");
        let _ = writer.flush();
    }
}

/// Quote a text-format token if it contains characters that would break
/// `key=value` parsing.
fn quote(s: &str) -> String {
    let needs_quoting =
        s.is_empty() || s.contains([' ', '"', '=', '\n', '\t']);
    if needs_quoting {
        format!("{s:?}")
    } else {
        s.to_string()
    }
}

/// One captured record.
#[derive(Debug, Clone)]
pub struct Emission {
    /// Severity the line was emitted at
    pub severity: Severity,
    /// Message passed to the emitter
    pub message: String,
    /// Full attribute snapshot, in insertion order
    pub attrs: Vec<Attr>,
}

impl Emission {
    /// First attribute value for `key`, rendered as a string.
    pub fn value(&self, key: &str) -> Option<String> {
        self.attrs
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.to_string())
    }
}

/// Capturing sink for tests and assertions on decorated services.
#[derive(Default)]
pub struct MemorySink {
    emissions: Mutex<Vec<Emission>>,
}

impl MemorySink {
    /// Create an empty capture sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured emissions, oldest first.
    pub fn emissions(&self) -> Vec<Emission> {
        self.emissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent emission, if any.
    pub fn last(&self) -> Option<Emission> {
        self.emissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Sink for MemorySink {
    fn emit(&self, severity: Severity, message: &str, attrs: &[Attr]) {
        self.emissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Emission {
                severity,
                message: message.to_string(),
                attrs: attrs.to_vec(),
            });
    }
}

/// Bridge sink forwarding into the `tracing` ecosystem.
///
/// `tracing` fields are static-keyed, so the dynamic attribute set travels
/// pre-rendered in a single `attrs` field while the severity maps onto the
/// event level. Useful when the surrounding application already ships a
/// `tracing_subscriber` pipeline.
pub struct TracingSink;

impl Sink for TracingSink {
    fn emit(&self, severity: Severity, message: &str, attrs: &[Attr]) {
        let rendered = render_attr_list(attrs);
        match severity {
            Severity::Debug => {
                tracing::debug!(target: "canlog", attrs = %rendered, "{}", message);
            }
            Severity::Info => {
                tracing::info!(target: "canlog", attrs = %rendered, "{}", message);
            }
            Severity::Warn => {
                tracing::warn!(target: "canlog", attrs = %rendered, "{}", message);
            }
            Severity::Error => {
                tracing::error!(target: "canlog", attrs = %rendered, "{}", message);
            }
        }
    }
}

fn render_attr_list(attrs: &[Attr]) -> String {
    let mut out = String::new();
    for (i, attr) in attrs.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&attr.key);
        out.push('=');
        out.push_str(&quote(&attr.value.to_string()));
    }
    out
}

static DEFAULT_SINK: LazyLock<RwLock<Arc<dyn Sink>>> =
    LazyLock::new(|| RwLock::new(Arc::new(FmtSink::default())));

/// Replace the process-wide default sink.
///
/// Intended to run once during startup, before concurrent traffic begins.
/// The swap itself is guarded, but operations already holding the previous
/// sink keep emitting to it.
pub fn set_default_sink(sink: Arc<dyn Sink>) {
    *DEFAULT_SINK
        .write()
        .unwrap_or_else(PoisonError::into_inner) = sink;
}

/// The process-wide default sink, used by lines without a bound override.
pub fn default_sink() -> Arc<dyn Sink> {
    Arc::clone(&DEFAULT_SINK.read().unwrap_or_else(PoisonError::into_inner))
}
