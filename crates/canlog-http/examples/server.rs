//! Decorated axum server example.
//!
//! Run with: cargo run --example server
//! Then: curl localhost:8080/users ; curl localhost:8080/error
//!
//! Every request produces exactly one canonical line on stdout, carrying the
//! request attributes, whatever the handler attached, the status code, and
//! the elapsed duration.

use std::sync::Arc;

use axum::{http::StatusCode, middleware, routing::get, Extension, Router};
use canlog::{set_default_sink, Attr, LineOutput, LogLine, SinkConfig, SinkExt};
use canlog_http::canonical_log_middleware;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let sink = SinkConfig::new()
        .with_output(LineOutput::Stdout)
        .build()
        .with_attrs(vec![Attr::new("service", "demo"), Attr::new("env", "local")]);
    set_default_sink(Arc::new(sink));

    let app = Router::new()
        .route("/users", get(user_handler))
        .route("/error", get(error_handler))
        .layer(middleware::from_fn(canonical_log_middleware));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    println!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn user_handler(Extension(line): Extension<LogLine>) -> StatusCode {
    line.attach("user_id", "123");
    StatusCode::OK
}

async fn error_handler(Extension(line): Extension<LogLine>) -> StatusCode {
    line.attach("error", "demo_error");
    StatusCode::INTERNAL_SERVER_ERROR
}
