// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ErrorBody,
    pipeline,
    state::AppState,
};

pub mod health;

/// Builds the full gateway router.
///
/// Gateway-owned endpoints (health, docs) are registered as routes;
/// everything else falls through to the proxy pipeline. Health therefore
/// bypasses rate limiting and auth by construction.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(pipeline::dispatch)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(health::liveness, health::readiness),
    components(
        schemas(
            health::HealthResponse,
            health::ReadyResponse,
            health::ServiceHealth,
            ErrorBody
        )
    ),
    tags(
        (name = "Health", description = "Liveness and downstream readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthSettings, GatewayConfig};
    use crate::rate_limit::RateLimitSettings;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;
    use url::Url;

    fn test_state() -> AppState {
        let config = GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            auth: AuthSettings {
                secret: "router-test-secret".to_string(),
                issuer: None,
                audience: None,
                allow_ephemeral: false,
            },
            rate_limit: RateLimitSettings::default(),
            proxy_timeout: Duration::from_secs(30),
            auth_service_url: Url::parse("http://localhost:3001").unwrap(),
            game_service_url: Url::parse("http://localhost:3002").unwrap(),
            profile_service_url: Url::parse("http://localhost:3003").unwrap(),
        };
        AppState::new(&config)
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(test_state());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service_with_connect_info::<std::net::SocketAddr>();
    }

    #[tokio::test]
    async fn health_answers_without_touching_the_pipeline() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::get("/api-doc/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/health"].is_object());
        assert!(doc["paths"]["/health/ready"].is_object());
    }
}
