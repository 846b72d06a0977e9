// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request pipeline for proxied traffic.
//!
//! Installed as the router fallback, so gateway-owned endpoints (health,
//! docs) never pass through it. Per request, in order: derive the client
//! key, charge the rate window, look up the owning route, resolve an
//! identity when the matched rule demands one, dispatch downstream. The
//! first failing stage converts to the uniform error response and the rest
//! of the pipeline never runs.
//!
//! Rate admission deliberately precedes route lookup: a client hammering
//! unknown paths burns its window like any other client.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::AuthContext;
use crate::error::GatewayError;
use crate::rate_limit::{client_key, RateDecision};
use crate::state::AppState;

/// Fallback handler carrying every proxied request through the pipeline.
pub async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
) -> Result<Response, GatewayError> {
    let path = request.uri().path().to_string();
    let key = client_key(request.headers(), Some(peer.ip()));

    if let RateDecision::Rejected { retry_after } = state.limiter.admit(&key) {
        warn!(client = %key, path = %path, "rate ceiling reached");
        return Err(GatewayError::RateLimited { retry_after });
    }

    let Some(rule) = state.routes.resolve(&path) else {
        debug!(client = %key, path = %path, "no route owns path");
        return Err(GatewayError::NoRoute);
    };

    let context = if rule.requires_auth {
        let authorization = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        match state.resolver.authenticate(authorization) {
            Ok(context) => context,
            Err(error) => {
                // The message carries payload field names at most, never
                // token material.
                warn!(
                    client = %key,
                    path = %path,
                    kind = error.kind(),
                    %error,
                    "authentication failed"
                );
                return Err(error.into());
            }
        }
    } else {
        AuthContext::anonymous()
    };

    debug!(client = %key, service = %rule.service, path = %path, "forwarding");
    state.proxy.forward(rule, &context, request).await
}
