// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness response with individual downstream probe results.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall status ("ok" or "degraded").
    pub status: String,
    /// When the probes ran.
    pub timestamp: DateTime<Utc>,
    /// One entry per configured downstream.
    pub services: Vec<ServiceHealth>,
}

/// A single downstream's probe result.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceHealth {
    /// Logical downstream name from the routing table.
    pub service: String,
    /// `ok` when the downstream's own health endpoint answered 2xx,
    /// `unavailable` otherwise.
    pub status: String,
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running. Never rate-limited and
/// never touches a downstream - use readiness for that.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
///
/// Probes each configured downstream's health endpoint with a short
/// timeout. Returns 200 only when every downstream is reachable, 503
/// otherwise; the body lists per-service results either way.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "All downstreams reachable", body = ReadyResponse),
        (status = 503, description = "One or more downstreams unreachable", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let mut services = Vec::with_capacity(state.routes.rules().len());
    for rule in state.routes.rules() {
        let healthy = state.proxy.check_health(&rule.target).await;
        services.push(ServiceHealth {
            service: rule.service.clone(),
            status: if healthy { "ok" } else { "unavailable" }.to_string(),
        });
    }

    let all_ok = services.iter().all(|s| s.status == "ok");
    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        timestamp: Utc::now(),
        services,
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
