// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Downstream dispatch and failure containment.
//!
//! A single shared HTTP client forwards matched requests to their
//! downstream: method, headers (minus `Host`), query string and body pass
//! through unmodified, and the downstream response comes back verbatim.
//! Transport failures never escape raw: refused connections, resets and
//! timeouts all collapse into [`GatewayError::ServiceUnavailable`] after a
//! single attempt.
//!
//! The forwarder is also the trust boundary for identity propagation:
//! inbound `x-user-*` headers are dropped unconditionally and re-stamped
//! from the verified [`AuthContext`], so a downstream can trust them without
//! re-deriving the identity.

use std::time::Duration;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::response::Response;
use tracing::{error, warn};
use url::Url;
use uuid::Uuid;

use super::table::RouteRule;
use crate::auth::AuthContext;
use crate::error::GatewayError;

/// Identity headers stamped at the trust boundary.
pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_USERNAME: &str = "x-username";
pub const HEADER_USER_EMAIL: &str = "x-user-email";
pub const HEADER_AUTH_PROVIDER: &str = "x-auth-provider";

/// Correlation id forwarded to every downstream.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Connection-level response headers that must not be copied onto the
/// rebuilt response.
const HOP_BY_HOP: &[&str] = &["connection", "keep-alive", "transfer-encoding", "upgrade"];

/// Per-probe timeout for downstream health checks.
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared client for all downstream traffic.
#[derive(Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
}

impl ProxyClient {
    /// Builds the client with a bounded total wait per dispatch, TCP
    /// keep-alive and a small idle pool per downstream host.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .expect("Failed to create HTTP client");
        ProxyClient { client }
    }

    /// Forwards `request` to the rule's downstream, single attempt.
    ///
    /// The downstream's own status and body pass through untouched,
    /// including its error responses; only transport failures are replaced
    /// by the uniform unavailable outcome.
    pub async fn forward(
        &self,
        rule: &RouteRule,
        context: &AuthContext,
        request: Request,
    ) -> Result<Response, GatewayError> {
        let path = rule.rewritten_path(request.uri().path());
        let target_url = match request.uri().query() {
            Some(query) => format!("{}{}?{}", base_url(&rule.target), path, query),
            None => format!("{}{}", base_url(&rule.target), path),
        };

        let method = request.method().clone();
        let headers = request.headers().clone();
        let request_id = request_id(&headers);

        let (_parts, body) = request.into_parts();
        let body_bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|_| GatewayError::ServiceUnavailable {
                service: rule.service.clone(),
            })?;

        let mut outbound = self.client.request(method, &target_url);
        for (name, value) in headers.iter() {
            if name == header::HOST || is_identity_header(name) || name.as_str() == HEADER_REQUEST_ID
            {
                continue;
            }
            outbound = outbound.header(name, value);
        }

        // Only the gateway writes identity headers; whatever the client sent
        // under those names was dropped above.
        outbound = outbound.header(HEADER_REQUEST_ID, request_id);
        if context.authenticated {
            if let Some(identity) = &context.identity {
                if let Some(value) = header_value(&identity.id) {
                    outbound = outbound.header(HEADER_USER_ID, value);
                }
                if let Some(value) = header_value(&identity.username) {
                    outbound = outbound.header(HEADER_USERNAME, value);
                }
                if let Some(value) = identity.email.as_deref().and_then(header_value) {
                    outbound = outbound.header(HEADER_USER_EMAIL, value);
                }
                if let Some(value) = identity.provider_id.as_deref().and_then(header_value) {
                    outbound = outbound.header(HEADER_AUTH_PROVIDER, value);
                }
            }
        }

        if !body_bytes.is_empty() {
            outbound = outbound.body(body_bytes.to_vec());
        }

        let response = match outbound.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(service = %rule.service, error = %e, "downstream dispatch failed");
                return Err(GatewayError::ServiceUnavailable {
                    service: rule.service.clone(),
                });
            }
        };

        let status = response.status();
        let response_headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            error!(service = %rule.service, error = %e, "downstream response read failed");
            GatewayError::ServiceUnavailable {
                service: rule.service.clone(),
            }
        })?;

        let mut builder = Response::builder().status(status);
        for (name, value) in response_headers.iter() {
            if HOP_BY_HOP.contains(&name.as_str()) {
                continue;
            }
            builder = builder.header(name, value);
        }
        builder
            .body(Body::from(body))
            .map_err(|_| GatewayError::ServiceUnavailable {
                service: rule.service.clone(),
            })
    }

    /// Short-timeout probe of a downstream's own `/health` endpoint.
    pub async fn check_health(&self, target: &Url) -> bool {
        let health_url = format!("{}/health", base_url(target));
        match self
            .client
            .get(&health_url)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(target = %target, error = %e, "downstream health check failed");
                false
            }
        }
    }
}

/// Base URL without its trailing slash, so path concatenation stays clean.
fn base_url(target: &Url) -> &str {
    target.as_str().trim_end_matches('/')
}

fn is_identity_header(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        HEADER_USER_ID | HEADER_USERNAME | HEADER_USER_EMAIL | HEADER_AUTH_PROVIDER
    )
}

fn header_value(s: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(s).ok()
}

/// Inbound correlation id when the client sent one, else a fresh uuid.
fn request_id(headers: &HeaderMap) -> HeaderValue {
    headers.get(HEADER_REQUEST_ID).cloned().unwrap_or_else(|| {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("gateway"))
    })
}
