// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential classification.
//!
//! Splits the raw `Authorization` header into one of three kinds before any
//! cryptography happens: no usable bearer value, a reserved short-lived test
//! credential, or an opaque value that must go through signature
//! verification. Classification is a pure function of the header text and
//! the ephemeral-enablement flag; it makes no claim about validity.

/// Prefixes reserved for short-lived, non-production identities.
///
/// Only honored when the deployment explicitly enables ephemeral credentials
/// (`GATEWAY_ALLOW_EPHEMERAL`); otherwise values carrying these prefixes are
/// ordinary signed candidates and fail verification like any other garbage.
pub const EPHEMERAL_PREFIXES: &[&str] = &["ephemeral_", "test_", "mock_"];

/// Coarse classification of an inbound credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// No `Authorization` header, or not of the `Bearer <token>` shape
    Absent,
    /// Reserved test-identity prefix (only with ephemeral credentials enabled)
    Ephemeral,
    /// Anything else; must be verified before it means anything
    Signed,
}

impl TokenKind {
    /// Classifies an extracted bearer credential.
    pub fn classify(credential: Option<&str>, allow_ephemeral: bool) -> TokenKind {
        let Some(credential) = credential else {
            return TokenKind::Absent;
        };
        if credential.is_empty() {
            return TokenKind::Absent;
        }
        if allow_ephemeral
            && EPHEMERAL_PREFIXES
                .iter()
                .any(|prefix| credential.starts_with(prefix))
        {
            return TokenKind::Ephemeral;
        }
        TokenKind::Signed
    }
}

/// Extracts the bearer credential from an `Authorization` header value.
///
/// Returns `None` for missing headers, non-bearer schemes, and headers whose
/// token part is empty or whitespace.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
