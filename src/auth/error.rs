// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::http::StatusCode;

/// Authentication error type.
///
/// Every failure of credential classification or claim resolution collapses
/// into one of these kinds. Messages are safe to return to the caller: they
/// never contain credential material, only (for [`AuthError::IncompleteClaims`])
/// the names of the payload fields that were present.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// No bearer credential was presented
    #[error("Authorization header with a bearer token is required")]
    MissingCredential,
    /// Token failed signature, issuer or audience verification, or is malformed
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// Token validity window has lapsed
    #[error("Token has expired")]
    Expired,
    /// Verified payload did not yield a usable id and username
    #[error("Token verified but identity claims are incomplete (payload fields: {})", .present.join(", "))]
    IncompleteClaims {
        /// Top-level field names found in the payload, for diagnostics only
        present: Vec<String>,
    },
}

impl AuthError {
    /// Stable snake_case kind, used as the `error` field of the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "token_expired",
            AuthError::IncompleteClaims { .. } => "incomplete_claims",
        }
    }

    /// All authentication failures refuse the request the same way.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    /// Builds `IncompleteClaims` from a verified payload, recording which
    /// top-level fields were actually present. Sorted so the diagnostic is
    /// stable regardless of payload key order.
    pub fn incomplete_claims(payload: &serde_json::Value) -> Self {
        let mut present: Vec<String> = payload
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        present.sort();
        AuthError::IncompleteClaims { present }
    }
}
