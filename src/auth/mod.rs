// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Credential classification and identity resolution for the gateway.
//!
//! ## Resolution Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. The classifier tags the credential: absent, ephemeral (reserved test
//!    prefixes, only when explicitly enabled) or signed
//! 3. Signed credentials are verified (HS256 shared secret, optional
//!    issuer/audience, 60 second clock-skew leeway) and their payload is
//!    resolved to a [`CanonicalIdentity`]:
//!    - flat payloads walk the ordered fallback chains (id: `id`,
//!      `user_id`, `sub`, `userId`, `uid`; username: `username`,
//!      `preferred_username`, `name`, `user_name`, `login`)
//!    - payloads embedding an OAuth provider profile go through
//!      [`oauth::normalize_profile`] instead
//!
//! ## Security
//!
//! - Classification makes no cryptographic claim; every signed credential
//!   is verified before any claim is trusted
//! - The ephemeral path is off by default and refused entirely unless the
//!   deployment sets `GATEWAY_ALLOW_EPHEMERAL`
//! - Error messages never carry credential material

pub mod claims;
pub mod error;
pub mod oauth;
pub mod resolver;
pub mod token;

pub use claims::{AuthContext, CanonicalIdentity};
pub use error::AuthError;
pub use resolver::ClaimResolver;
pub use token::TokenKind;
