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
//! Request decoration and scope association.

use std::time::Instant;

use axum::{extract::Request, http::Extensions, middleware::Next, response::Response};
use canlog::LogLine;

/// Attribute key for the request method.
pub const KEY_HTTP_METHOD: &str = "http.method";

/// Attribute key for the request target (path plus query).
pub const KEY_HTTP_PATH: &str = "http.path";

/// Attribute key for the response status code.
pub const KEY_HTTP_STATUS: &str = "http.status_code";

/// Message carried by every canonical request line.
const REQUEST_MESSAGE: &str = "http-request";

/// Look up the request's log line, or create a detached fallback.
///
/// The line is keyed by its own type in the extension map, so no string key
/// can collide with it. When the chain never went through
/// [`canonical_log_middleware`] this returns a fresh scope instead of
/// failing — accumulator calls must never break the surrounding handler.
///
/// Known constraint: a fallback scope is visible only through the handle
/// returned here. Another lookup on the same untouched `Extensions` yields
/// an independent fallback, so attributes attached to a fallback that is
/// never emitted by its holder are lost. Source both accumulation and
/// emission from the same handle.
pub fn log_line(extensions: &Extensions) -> LogLine {
    extensions.get::<LogLine>().cloned().unwrap_or_default()
}

/// Canonical log line middleware in `axum::middleware::from_fn` form.
///
/// Creates the per-request scope, attaches `http.method` and `http.path`
/// before the inner handler runs, and attaches `http.status_code` plus
/// `duration` afterwards, emitting exactly one `"http-request"` record.
/// Emission is a drop-guard finalizer: it still runs if the inner handler
/// panics (the status attribute is then absent), and the panic itself is
/// neither caught nor altered. Timing starts before the inner handler and
/// stops when the guard runs, regardless of outcome.
pub async fn canonical_log_middleware(mut request: Request, next: Next) -> Response {
    let line = LogLine::new();
    let started = Instant::now();

    line.attach(KEY_HTTP_METHOD, request.method().as_str().to_owned());
    line.attach(KEY_HTTP_PATH, request_target(&request));
    request.extensions_mut().insert(line.clone());

    let mut finalizer = EmitOnReturn {
        line,
        started,
        status: None,
    };

    let response = next.run(request).await;
    finalizer.status = Some(response.status().as_u16());
    response
}

/// Path plus query, matching what the client sent on the request line.
fn request_target(request: &Request) -> String {
    request
        .uri()
        .path_and_query()
        .map(|target| target.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned())
}

struct EmitOnReturn {
    line: LogLine,
    started: Instant,
    status: Option<u16>,
}

impl Drop for EmitOnReturn {
    fn drop(&mut self) {
        if let Some(status) = self.status {
            self.line.attach(KEY_HTTP_STATUS, status);
        }
        self.line.attach_duration(self.started.elapsed());
        self.line.emit(REQUEST_MESSAGE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_the_stored_scope() {
        let mut extensions = Extensions::new();
        let line = LogLine::new();
        extensions.insert(line.clone());

        log_line(&extensions).attach("k", "v");

        assert_eq!(line.snapshot().len(), 1, "lookup must share the stored scope");
    }

    #[test]
    fn missing_scope_yields_a_detached_fallback() {
        let extensions = Extensions::new();

        // Never fails, even though no middleware ran.
        let fallback = log_line(&extensions);
        fallback.attach("k", "v");
        assert_eq!(fallback.snapshot().len(), 1);

        // The hazard, asserted rather than hidden: a second lookup cannot
        // see the first fallback.
        let second = log_line(&extensions);
        assert!(second.snapshot().is_empty());
    }
}
