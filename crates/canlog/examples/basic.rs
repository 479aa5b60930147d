//! Wrapped-operation example: business logic only attaches attributes; the
//! wrapper owns timing, error capture, and the single emission.
//!
//! Run with: cargo run --example basic

use std::sync::Arc;
use std::time::Instant;

use canlog::{set_default_sink, Attr, LineOutput, LogLine, SinkConfig, SinkExt};

type OpError = Box<dyn std::error::Error + Send + Sync>;

fn execute_logged(operation: &'static str, f: impl FnOnce(&LogLine) -> Result<(), OpError>) {
    let line = LogLine::new();
    line.attach("operation", operation);

    let started = Instant::now();
    if let Err(err) = f(&line) {
        line.attach_error(err);
    }
    line.attach_duration(started.elapsed());

    // The wrapper emits; the operation never touches the sink.
    line.emit(operation);
}

fn main() {
    let sink = SinkConfig::new()
        .with_output(LineOutput::Stdout)
        .build()
        .with_attrs(vec![Attr::new("service", "demo"), Attr::new("env", "local")]);
    set_default_sink(Arc::new(sink));

    execute_logged("validate_user", |line| {
        line.attach("user_id", "123");
        line.attach("is_valid", true);
        Ok(())
    });

    execute_logged("process_payment", |line| {
        line.attach("payment_id", "PAY123");
        line.attach("amount", 99.99);
        Ok(())
    });

    execute_logged("process_with_error", |_| Err("something went wrong".into()));
}
