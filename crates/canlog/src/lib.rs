//! Canonical log line accumulation
//!
//! Instead of emitting many scattered log records over the lifetime of an
//! operation, a [`LogLine`] collects structured key/value attributes in a
//! request-scoped buffer and emits exactly one record when the operation
//! completes. Business logic attaches attributes without knowing anything
//! about the output format, severity policy, or transport.
//!
//! # Features
//!
//! - **Append-only accumulation**: attributes keep their insertion order and
//!   are never removed before emission
//! - **Derived severity**: a line is emitted at error level iff an `error`
//!   attribute was attached, info otherwise
//! - **Pluggable sinks**: text/JSON formatting sinks, a capture sink for
//!   tests, and a bridge into the `tracing` ecosystem
//! - **Scope-local sink override**: a line can be bound to its own sink,
//!   bypassing the process-wide default
//!
//! # Example
//!
//! ```ignore
//! use canlog::LogLine;
//!
//! let line = LogLine::new();
//! line.attach("user_id", "123");
//! line.attach("is_valid", true);
//! line.emit("validate_user");
//! ```

pub mod config;
pub mod line;
pub mod sink;
pub mod value;

pub use config::{ConfigError, LineFormat, LineOutput, SinkConfig};
pub use line::{LogLine, KEY_DURATION, KEY_ERROR};
pub use sink::{
    default_sink, set_default_sink, Emission, FmtSink, MemorySink, Severity, Sink, SinkExt,
    TracingSink, WithAttrs,
};
pub use value::{Attr, SharedError, Value};
