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
//! The scoped log line: one per logical operation.
//!
//! A [`LogLine`] is a cheaply cloneable handle over an append-only attribute
//! sequence. Cloning the handle shares the underlying scope, so a child call
//! chain that receives a clone mutates the same line; creating a fresh
//! `LogLine` starts a new scope that shadows the outer one from that point
//! on. Accumulator calls never fail and never perform I/O; the single final
//! [`emit`](LogLine::emit) is the only write.

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::sink::{default_sink, Severity, Sink};
use crate::value::{Attr, SharedError, Value};

/// Attribute key written by [`LogLine::attach_duration`].
pub const KEY_DURATION: &str = "duration";

/// Attribute key written by [`LogLine::attach_error`]. Presence of this key
/// is the sole signal that bumps derived severity to error.
pub const KEY_ERROR: &str = "error";

/// A request-scoped canonical log line.
///
/// The handle assumes one owning thread of control per scope, the usual
/// one-task-per-request arrangement. Attachment is still guarded by a mutex,
/// so fanned-out subtasks sharing a clone cannot corrupt the sequence; their
/// relative attribute order is whatever order the lock grants.
#[derive(Clone, Default)]
pub struct LogLine {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    attrs: Vec<Attr>,
    sink: Option<Arc<dyn Sink>>,
}

impl LogLine {
    /// Create a fresh, empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking attacher must not wedge every later emission.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a key/value attribute. Duplicate keys are preserved in order;
    /// last-wins is a sink or query-time concern.
    pub fn attach(&self, key: impl Into<Cow<'static, str>>, value: impl Into<Value>) {
        self.lock().attrs.push(Attr::new(key, value));
    }

    /// Append the elapsed time of the operation under the fixed
    /// [`KEY_DURATION`] key.
    pub fn attach_duration(&self, duration: Duration) {
        self.attach(KEY_DURATION, duration);
    }

    /// Append an application error under the fixed [`KEY_ERROR`] key.
    ///
    /// The error is data, not a failure of this library: it is preserved
    /// verbatim for the sink to render, and its presence derives error
    /// severity at emission.
    pub fn attach_error(&self, error: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) {
        let shared: SharedError = Arc::from(error.into());
        self.attach(KEY_ERROR, Value::Error(shared));
    }

    /// Bind a scope-local sink override. Emission uses it instead of the
    /// process-wide default; the last call wins.
    pub fn bind_sink(&self, sink: Arc<dyn Sink>) {
        self.lock().sink = Some(sink);
    }

    /// Severity the line would currently emit at: error iff any attribute
    /// carries the [`KEY_ERROR`] key, info otherwise.
    pub fn severity(&self) -> Severity {
        derive_severity(&self.lock().attrs)
    }

    /// Snapshot of the accumulated attributes, in insertion order.
    pub fn snapshot(&self) -> Vec<Attr> {
        self.lock().attrs.clone()
    }

    /// Emit one record carrying the message and the full accumulated
    /// attribute sequence, at the derived severity.
    ///
    /// By convention this is called exactly once per operation. It is not
    /// enforced: a second call re-emits the state accumulated by then,
    /// which permits periodic snapshots but makes duplicate final lines a
    /// caller error.
    pub fn emit(&self, message: &str) {
        let (severity, sink, attrs) = self.prepare();
        sink.emit(severity, message, &attrs);
    }

    /// Emit at an explicit severity, bypassing derivation.
    pub fn emit_with(&self, severity: Severity, message: &str) {
        let (_, sink, attrs) = self.prepare();
        sink.emit(severity, message, &attrs);
    }

    /// Resolve sink and snapshot state without holding the lock across the
    /// sink write.
    fn prepare(&self) -> (Severity, Arc<dyn Sink>, Vec<Attr>) {
        let guard = self.lock();
        let attrs = guard.attrs.clone();
        let sink = guard.sink.clone();
        drop(guard);

        let severity = derive_severity(&attrs);
        let sink = sink.unwrap_or_else(default_sink);
        (severity, sink, attrs)
    }
}

fn derive_severity(attrs: &[Attr]) -> Severity {
    if attrs.iter().any(|a| a.key == KEY_ERROR) {
        Severity::Error
    } else {
        Severity::Info
    }
}

impl fmt::Debug for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.lock();
        f.debug_struct("LogLine")
            .field("attrs", &guard.attrs)
            .field("sink_bound", &guard.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::io;
    use std::thread;

    fn bound(sink: &Arc<MemorySink>) -> LogLine {
        let line = LogLine::new();
        line.bind_sink(Arc::clone(sink) as Arc<dyn Sink>);
        line
    }

    #[test]
    fn emission_carries_all_attributes_in_insertion_order() {
        let sink = Arc::new(MemorySink::new());
        let line = bound(&sink);

        line.attach("key1", "value1");
        line.attach("key2", "value2");
        line.attach("key3", "value3");
        line.emit("multiple attributes");

        let emission = sink.last().unwrap();
        assert_eq!(emission.message, "multiple attributes");
        let keys: Vec<_> = emission.attrs.iter().map(|a| a.key.as_ref()).collect();
        assert_eq!(keys, vec!["key1", "key2", "key3"]);
    }

    #[test]
    fn duplicate_keys_are_preserved() {
        let sink = Arc::new(MemorySink::new());
        let line = bound(&sink);

        line.attach("retry", 1i64);
        line.attach("retry", 2i64);
        line.emit("m");

        let emission = sink.last().unwrap();
        assert_eq!(emission.attrs.len(), 2);
        assert_eq!(emission.attrs[0].value.to_string(), "1");
        assert_eq!(emission.attrs[1].value.to_string(), "2");
    }

    #[test]
    fn severity_is_info_without_error_attribute() {
        let sink = Arc::new(MemorySink::new());
        let line = bound(&sink);
        line.attach("user_id", "123");
        line.emit("m");
        assert_eq!(sink.last().unwrap().severity, Severity::Info);
    }

    #[test]
    fn attach_error_bumps_severity_to_error() {
        let sink = Arc::new(MemorySink::new());
        let line = bound(&sink);
        line.attach_error(io::Error::other("test error"));
        line.emit("error message");

        let emission = sink.last().unwrap();
        assert_eq!(emission.severity, Severity::Error);
        assert_eq!(emission.value(KEY_ERROR).as_deref(), Some("test error"));
    }

    #[test]
    fn manual_error_key_also_bumps_severity() {
        let sink = Arc::new(MemorySink::new());
        let line = bound(&sink);
        line.attach(KEY_ERROR, "demo_error");
        line.emit("m");
        assert_eq!(sink.last().unwrap().severity, Severity::Error);
    }

    #[test]
    fn emit_with_bypasses_derivation() {
        let sink = Arc::new(MemorySink::new());
        let line = bound(&sink);
        line.attach_error(io::Error::other("ignored for level"));
        line.emit_with(Severity::Warn, "m");
        assert_eq!(sink.last().unwrap().severity, Severity::Warn);
    }

    #[test]
    fn attach_duration_uses_the_fixed_key() {
        let sink = Arc::new(MemorySink::new());
        let line = bound(&sink);
        line.attach_duration(Duration::from_millis(100));
        line.emit("duration test");
        assert_eq!(
            sink.last().unwrap().value(KEY_DURATION).as_deref(),
            Some("100ms")
        );
    }

    #[test]
    fn clones_share_the_same_scope() {
        let sink = Arc::new(MemorySink::new());
        let line = bound(&sink);
        let child = line.clone();
        child.attach("from_child", true);
        line.emit("m");
        assert_eq!(sink.last().unwrap().value("from_child").as_deref(), Some("true"));
    }

    #[test]
    fn fresh_line_shadows_without_touching_the_outer_scope() {
        let outer_sink = Arc::new(MemorySink::new());
        let outer = bound(&outer_sink);
        outer.attach("outer", 1i64);

        let inner_sink = Arc::new(MemorySink::new());
        let inner = bound(&inner_sink);
        inner.attach("inner", 2i64);
        inner.emit("inner line");

        outer.emit("outer line");
        assert!(outer_sink.last().unwrap().value("inner").is_none());
        assert!(inner_sink.last().unwrap().value("outer").is_none());
    }

    #[test]
    fn second_emission_is_a_superset_snapshot() {
        let sink = Arc::new(MemorySink::new());
        let line = bound(&sink);

        line.attach("persistent", "value");
        line.emit("first message");
        line.attach("additional", "value2");
        line.emit("second message");

        let emissions = sink.emissions();
        assert_eq!(emissions.len(), 2);
        assert_eq!(emissions[0].attrs.len(), 1);
        assert_eq!(emissions[1].attrs.len(), 2);
        assert_eq!(emissions[1].value("persistent").as_deref(), Some("value"));
        assert_eq!(emissions[1].value("additional").as_deref(), Some("value2"));
    }

    #[test]
    fn last_bound_sink_wins() {
        let first = Arc::new(MemorySink::new());
        let second = Arc::new(MemorySink::new());
        let line = LogLine::new();
        line.bind_sink(Arc::clone(&first) as Arc<dyn Sink>);
        line.bind_sink(Arc::clone(&second) as Arc<dyn Sink>);
        line.emit("m");

        assert!(first.emissions().is_empty());
        assert_eq!(second.emissions().len(), 1);
    }

    #[test]
    fn concurrent_attachment_loses_nothing() {
        let sink = Arc::new(MemorySink::new());
        let line = bound(&sink);

        let handles: Vec<_> = (0..8i64)
            .map(|worker| {
                let line = line.clone();
                thread::spawn(move || {
                    for i in 0..50i64 {
                        line.attach("n", worker * 100 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        line.emit("fan-out");
        assert_eq!(sink.last().unwrap().attrs.len(), 8 * 50);
    }

    #[test]
    fn severity_is_queryable_before_emission() {
        let line = LogLine::new();
        assert_eq!(line.severity(), Severity::Info);
        line.attach_error(io::Error::other("x"));
        assert_eq!(line.severity(), Severity::Error);
    }
}
