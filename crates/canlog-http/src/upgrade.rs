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
//! Connection takeover capability.
//!
//! A handler that needs the raw connection (WebSocket and friends) claims
//! it through an explicit capability instead of downcasting the response
//! side: hyper parks an [`OnUpgrade`] in the request extensions when the
//! underlying transport can hand the connection over, and the decorator
//! forwards the request untouched, so the capability of the real transport
//! reaches the inner handler unchanged.

use axum::http::Request;
use hyper::upgrade::OnUpgrade;
use thiserror::Error;

/// Failure to take over the raw connection.
#[derive(Debug, Error)]
pub enum UpgradeError {
    /// The transport behind this request cannot hand over its connection.
    /// An explicit error, never an ambiguous empty result.
    #[error("connection upgrade not supported by the underlying transport")]
    Unsupported,
}

/// Claim the connection-takeover capability for this request.
///
/// Returns the pending upgrade when the transport supports it; completing
/// the takeover still requires responding with `101 Switching Protocols`.
/// The capability is moved out, so it can be claimed once.
pub fn claim_upgrade<B>(request: &mut Request<B>) -> Result<OnUpgrade, UpgradeError> {
    request
        .extensions_mut()
        .remove::<OnUpgrade>()
        .ok_or(UpgradeError::Unsupported)
}
