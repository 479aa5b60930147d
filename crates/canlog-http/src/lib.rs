//! HTTP boundary decorator for canonical log lines.
//!
//! Wraps an arbitrary axum handler chain: a fresh [`canlog::LogLine`] is
//! created per request and stored in the request extensions, `http.method`
//! and `http.path` are attached up front, and the final status code plus
//! elapsed duration are attached after the inner handler returns, when the
//! single `"http-request"` record is emitted. Handlers pull the line out
//! with `Extension<LogLine>` (or [`log_line`]) and attach whatever they
//! like; they never emit.
//!
//! # Example
//!
//! ```ignore
//! use axum::{middleware, routing::get, Extension, Router};
//! use canlog::LogLine;
//! use canlog_http::canonical_log_middleware;
//!
//! async fn handler(Extension(line): Extension<LogLine>) -> &'static str {
//!     line.attach("user_id", "123");
//!     "ok"
//! }
//!
//! let app: Router = Router::new()
//!     .route("/users", get(handler))
//!     .layer(middleware::from_fn(canonical_log_middleware));
//! ```

pub mod middleware;
pub mod upgrade;

pub use middleware::{
    canonical_log_middleware, log_line, KEY_HTTP_METHOD, KEY_HTTP_PATH, KEY_HTTP_STATUS,
};
pub use upgrade::{claim_upgrade, UpgradeError};
