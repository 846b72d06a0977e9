// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Canonical identity and claim extraction.
//!
//! Tokens reach this gateway from more than one producer and the payload
//! shapes drift: the subject id may arrive as `id`, `user_id`, `sub`,
//! `userId` or `uid` depending on who minted the token. Resolution therefore
//! walks an ordered fallback list per field and takes the first present
//! non-empty value. A payload that yields no id or no username is a hard
//! failure, never a partially-filled identity.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::AuthError;

/// Candidate payload fields for the subject id, in resolution order.
pub const SUBJECT_ID_FIELDS: &[&str] = &["id", "user_id", "sub", "userId", "uid"];

/// Candidate payload fields for the username, in resolution order.
pub const USERNAME_FIELDS: &[&str] =
    &["username", "preferred_username", "name", "user_name", "login"];

/// The normalized identity shape every resolved credential collapses into.
///
/// `id` and `username` are always non-empty; construction sites fail with
/// [`AuthError::IncompleteClaims`] rather than producing a hollow identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalIdentity {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Set for externally-issued identities so downstream consumers can
    /// distinguish them from locally minted ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

/// Per-request authentication outcome.
///
/// Attached to the request for the lifetime of that request only; never
/// persisted or cached across requests.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub authenticated: bool,
    pub identity: Option<CanonicalIdentity>,
    pub raw_token: Option<String>,
}

impl AuthContext {
    /// Context for a request that passed resolution.
    pub fn authenticated(identity: CanonicalIdentity, raw_token: impl Into<String>) -> Self {
        AuthContext {
            authenticated: true,
            identity: Some(identity),
            raw_token: Some(raw_token.into()),
        }
    }

    /// Context for a route that does not require authentication.
    pub fn anonymous() -> Self {
        AuthContext::default()
    }
}

/// Renders a claim value as a non-empty string.
///
/// Producers disagree on string-vs-number ids, so JSON numbers are accepted
/// and rendered; everything else (objects, arrays, booleans, null) counts as
/// absent rather than being coerced.
fn claim_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Walks `fields` in order and returns the first present non-empty value.
pub fn first_claim(payload: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| payload.get(*field).and_then(claim_str))
}

fn optional_str(payload: &Value, field: &str) -> Option<String> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extracts a canonical identity from a verified flat payload.
///
/// Email and provider id pass through when present (`providerId` wins over
/// `provider`); a payload exhausting either the id or username chain fails
/// with the list of fields that were actually present.
pub fn identity_from_claims(payload: &Value) -> Result<CanonicalIdentity, AuthError> {
    let id = first_claim(payload, SUBJECT_ID_FIELDS);
    let username = first_claim(payload, USERNAME_FIELDS);
    match (id, username) {
        (Some(id), Some(username)) => Ok(CanonicalIdentity {
            id,
            username,
            email: optional_str(payload, "email"),
            provider_id: optional_str(payload, "providerId")
                .or_else(|| optional_str(payload, "provider")),
        }),
        _ => Err(AuthError::incomplete_claims(payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_chain_prefers_documented_order() {
        let payload = json!({"id": "a", "user_id": "b", "sub": "c", "userId": "d", "uid": "e"});
        assert_eq!(first_claim(&payload, SUBJECT_ID_FIELDS).as_deref(), Some("a"));

        let payload = json!({"sub": "c", "uid": "e"});
        assert_eq!(first_claim(&payload, SUBJECT_ID_FIELDS).as_deref(), Some("c"));

        let payload = json!({"uid": "e"});
        assert_eq!(first_claim(&payload, SUBJECT_ID_FIELDS).as_deref(), Some("e"));
    }

    #[test]
    fn id_wins_over_sub_when_both_present() {
        let payload = json!({"id": "primary", "sub": "secondary", "username": "u"});
        let identity = identity_from_claims(&payload).unwrap();
        assert_eq!(identity.id, "primary");
    }

    #[test]
    fn username_chain_prefers_documented_order() {
        let payload = json!({"preferred_username": "p", "login": "l"});
        assert_eq!(first_claim(&payload, USERNAME_FIELDS).as_deref(), Some("p"));

        let payload = json!({"user_name": "un", "login": "l"});
        assert_eq!(first_claim(&payload, USERNAME_FIELDS).as_deref(), Some("un"));
    }

    #[test]
    fn empty_and_whitespace_values_are_skipped() {
        let payload = json!({"id": "", "user_id": "   ", "sub": "real"});
        assert_eq!(first_claim(&payload, SUBJECT_ID_FIELDS).as_deref(), Some("real"));
    }

    #[test]
    fn numeric_claims_are_rendered() {
        let payload = json!({"id": 42, "username": "alice"});
        let identity = identity_from_claims(&payload).unwrap();
        assert_eq!(identity.id, "42");
    }

    #[test]
    fn non_scalar_claims_count_as_absent() {
        let payload = json!({"id": {"nested": true}, "sub": "s-1", "username": ["x"], "name": "n"});
        let identity = identity_from_claims(&payload).unwrap();
        assert_eq!(identity.id, "s-1");
        assert_eq!(identity.username, "n");
    }

    #[test]
    fn sub_and_login_payload_resolves() {
        let payload = json!({"sub": "42", "login": "alice"});
        let identity = identity_from_claims(&payload).unwrap();
        assert_eq!(identity.id, "42");
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.email, None);
        assert_eq!(identity.provider_id, None);
    }

    #[test]
    fn missing_username_chain_fails_with_present_fields() {
        let payload = json!({"sub": "42", "iat": 100, "exp": 200});
        let error = identity_from_claims(&payload).unwrap_err();
        assert_eq!(
            error,
            AuthError::IncompleteClaims {
                present: vec!["exp".into(), "iat".into(), "sub".into()],
            }
        );
    }

    #[test]
    fn missing_id_chain_fails() {
        let payload = json!({"username": "alice"});
        assert!(matches!(
            identity_from_claims(&payload),
            Err(AuthError::IncompleteClaims { .. })
        ));
    }

    #[test]
    fn email_and_provider_pass_through() {
        let payload = json!({
            "id": "u-1",
            "username": "alice",
            "email": "alice@example.com",
            "providerId": "github",
            "provider": "ignored",
        });
        let identity = identity_from_claims(&payload).unwrap();
        assert_eq!(identity.email.as_deref(), Some("alice@example.com"));
        assert_eq!(identity.provider_id.as_deref(), Some("github"));

        let payload = json!({"id": "u-1", "username": "alice", "provider": "google"});
        let identity = identity_from_claims(&payload).unwrap();
        assert_eq!(identity.provider_id.as_deref(), Some("google"));
    }
}
