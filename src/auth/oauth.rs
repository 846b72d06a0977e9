// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Third-party profile normalization.
//!
//! OAuth providers return profile payloads of provider-defined shape: ids as
//! strings or numbers under `id` or `sub`, display names under several
//! conventions, emails either flat or as an array of `{value}` objects. This
//! adapter collapses all of them into the same [`CanonicalIdentity`] the
//! rest of the pipeline consumes, so nothing downstream distinguishes an
//! OAuth-derived identity from a locally issued one except by its
//! `provider_id` tag.

use serde_json::Value;

use super::claims::{first_claim, CanonicalIdentity};
use super::error::AuthError;

/// Candidate profile fields for the subject id, in resolution order.
const PROFILE_ID_FIELDS: &[&str] = &["id", "sub"];

/// Candidate profile fields for the display name, in resolution order.
const PROFILE_NAME_FIELDS: &[&str] = &["displayName", "username", "login", "name"];

/// Tag applied when the profile does not name its provider, so
/// externally-derived identities are still distinguishable downstream.
const FALLBACK_PROVIDER: &str = "oauth";

/// Normalizes a provider profile payload into a canonical identity.
///
/// Missing email is permitted; a profile without a usable id or display name
/// fails with [`AuthError::IncompleteClaims`] carrying the field names that
/// were present.
pub fn normalize_profile(profile: &Value) -> Result<CanonicalIdentity, AuthError> {
    let id = first_claim(profile, PROFILE_ID_FIELDS);
    let username = first_claim(profile, PROFILE_NAME_FIELDS);
    match (id, username) {
        (Some(id), Some(username)) => Ok(CanonicalIdentity {
            id,
            username,
            email: profile_email(profile),
            provider_id: Some(
                profile
                    .get("provider")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(FALLBACK_PROVIDER)
                    .to_string(),
            ),
        }),
        _ => Err(AuthError::incomplete_claims(profile)),
    }
}

/// First email address of the profile: the provider array shape
/// (`emails[0].value`) wins, flat `email` is the fallback.
fn profile_email(profile: &Value) -> Option<String> {
    profile
        .pointer("/emails/0/value")
        .or_else(|| profile.get("email"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
