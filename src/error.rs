// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;

/// Uniform body for every error the gateway synthesizes itself. Downstream
/// error responses pass through untouched and never take this shape.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`
    pub success: bool,
    /// Stable snake_case error kind
    pub error: String,
    /// Human-readable description, free of credential material
    pub message: String,
}

/// Everything the pipeline can refuse a request with.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Too many requests from this client, retry later")]
    RateLimited { retry_after: Duration },
    #[error("No downstream service matches the requested path")]
    NoRoute,
    #[error("The {service} service is currently unavailable")]
    ServiceUnavailable { service: String },
}

impl GatewayError {
    /// Stable snake_case kind, used as the `error` field of the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Auth(e) => e.kind(),
            GatewayError::RateLimited { .. } => "rate_limited",
            GatewayError::NoRoute => "no_route",
            GatewayError::ServiceUnavailable { .. } => "service_unavailable",
        }
    }

    /// Every kind maps to exactly one status class.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Auth(e) => e.status_code(),
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::NoRoute => StatusCode::NOT_FOUND,
            GatewayError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let retry_after = match &self {
            GatewayError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        };
        let body = Json(ErrorBody {
            success: false,
            error: self.kind().to_string(),
            message: self.to_string(),
        });
        let mut response = (self.status(), body).into_response();

        if let Some(retry_after) = retry_after {
            // Rounded up: "Retry-After: 0" would invite an immediate retry.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            if let Ok(value) = header::HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn auth_errors_surface_as_unauthorized() {
        let response = GatewayError::from(AuthError::Expired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "token_expired");
    }

    #[tokio::test]
    async fn rate_limited_sets_retry_after() {
        let error = GatewayError::RateLimited {
            retry_after: Duration::from_millis(90_500),
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            "91"
        );

        let body = body_json(response).await;
        assert_eq!(body["error"], "rate_limited");
    }

    #[tokio::test]
    async fn no_route_is_not_found() {
        let response = GatewayError::NoRoute.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "no_route");
    }

    #[tokio::test]
    async fn downstream_failure_is_service_unavailable() {
        let error = GatewayError::ServiceUnavailable {
            service: "game".to_string(),
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "service_unavailable");
        assert!(body["message"].as_str().unwrap().contains("game"));
    }
}
