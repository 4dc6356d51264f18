//! # Hoverfly Mission API
//!
//! REST + WebSocket service for drone mission tracking.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Axum HTTP Server                         │
//! │         (/api/drone/*, /api/weather/*, /ws)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ApiContext                             │
//! │   (MissionStore, AuthProvider, Analyzer, Weather,           │
//! │    Broadcaster)                                             │
//! └─────────────────────────────────────────────────────────────┘
//!          │                    │                    │
//!          ▼                    ▼                    ▼
//! ┌────────────────┐   ┌────────────────┐   ┌────────────────┐
//! │  Mission Store │   │ Ingest Pipeline│   │  Mission       │
//! │ (memory/Scylla)│   │ (+ analysis)   │   │  Channels      │
//! └────────────────┘   └────────────────┘   └────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod ingest;
pub mod realtime;
pub mod routes;
pub mod services;

use axum::Json;
use axum::http::{HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::Router;
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use auth::{AuthProvider, Principal, StaticTokenAuth};
pub use config::Config;
pub use context::ApiContext;
pub use error::{ApiError, ApiResult};
pub use ingest::IngestPipeline;
pub use realtime::Broadcaster;

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": VERSION }))
}

/// Build the Axum router
pub fn build_router(ctx: ApiContext) -> Router {
    // CORS configuration; "*" opens the API to any origin, otherwise
    // only the configured origins are allowed.
    let origin = if ctx.config.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            ctx.config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok()),
        )
    };
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(origin)
        .allow_headers(Any);

    Router::new()
        // Mission CRUD + telemetry
        .route(
            "/api/drone/missions",
            post(routes::missions::create_mission).get(routes::missions::list_missions),
        )
        .route(
            "/api/drone/missions/{id}",
            get(routes::missions::get_mission)
                .put(routes::missions::update_mission)
                .delete(routes::missions::delete_mission),
        )
        .route(
            "/api/drone/missions/{id}/data",
            post(routes::missions::ingest_telemetry),
        )
        .route(
            "/api/drone/missions/{id}/analytics",
            get(routes::missions::mission_analytics),
        )
        .route(
            "/api/drone/missions/{mission_id}/threats/{threat_id}",
            put(routes::missions::update_threat),
        )
        // Weather proxy
        .route("/api/weather/current", get(routes::weather::current_weather))
        // Realtime channel
        .route("/ws", get(routes::ws::ws_upgrade))
        // Health check
        .route("/api/health", get(health_check))
        // State and middleware
        .with_state(ctx)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use hoverfly_domain::{ImageAnalysis, MissionType};
    use hoverfly_persistence::MemoryMissionStore;

    use crate::config::{AnalysisConfig, WeatherConfig};
    use crate::services::analysis::{AnalysisReport, StaticAnalyzer};
    use crate::services::weather::StaticWeather;

    const TOKEN: &str = "test-token";

    fn test_config() -> Config {
        Config {
            server_addr: "127.0.0.1:0".parse().unwrap(),
            analysis: AnalysisConfig {
                api_key: None,
                endpoint: String::new(),
                timeout: Duration::from_secs(1),
            },
            weather: WeatherConfig {
                api_key: None,
                endpoint: String::new(),
                timeout: Duration::from_secs(1),
            },
            log_level: "info".to_string(),
            cors_origins: vec!["*".to_string()],
        }
    }

    fn test_analyzer() -> StaticAnalyzer {
        StaticAnalyzer::new(AnalysisReport {
            analysis: ImageAnalysis {
                summary: "clear field".to_string(),
                findings: Vec::new(),
                confidence: 0.9,
                recommendations: Vec::new(),
                mission_type: MissionType::CropMonitoring,
                timestamp: Utc::now(),
            },
            threats: Vec::new(),
        })
    }

    fn test_router() -> (Router, Uuid) {
        let operator = Uuid::new_v4();
        let mut auth = StaticTokenAuth::new();
        auth.insert(
            TOKEN,
            Principal {
                user_id: operator,
                role: "operator".to_string(),
                permissions: vec![
                    auth::PERM_CREATE_MISSIONS.to_string(),
                    auth::PERM_DELETE_MISSIONS.to_string(),
                ],
            },
        );

        let ctx = ApiContext::new(
            Arc::new(MemoryMissionStore::new()),
            Arc::new(auth),
            Arc::new(test_analyzer()),
            Arc::new(StaticWeather::clear_day()),
            test_config(),
        );
        (build_router(ctx), operator)
    }

    fn authed(request: Request<Body>) -> Request<Body> {
        let (mut parts, body) = request.into_parts();
        parts.headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {TOKEN}").parse().unwrap(),
        );
        Request::from_parts(parts, body)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        authed(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn mission_draft() -> serde_json::Value {
        serde_json::json!({
            "name": "Vineyard survey",
            "type": "crop_monitoring",
            "schedule": { "startTime": Utc::now() },
        })
    }

    async fn create_mission(router: &Router) -> Uuid {
        let response = router
            .clone()
            .oneshot(json_request("POST", "/api/drone/missions", mission_draft()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        body["mission"]["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn health_is_open() {
        let (router, _) = test_router();
        let response = router
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (router, _) = test_router();
        let response = router
            .oneshot(
                Request::get("/api/drone/missions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_then_fetch_roundtrip() {
        let (router, _) = test_router();
        let id = create_mission(&router).await;

        let response = router
            .oneshot(authed(
                Request::get(format!("/api/drone/missions/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["mission"]["name"], "Vineyard survey");
        assert_eq!(body["mission"]["status"], "planned");
    }

    #[tokio::test]
    async fn invalid_draft_lists_every_field() {
        let (router, _) = test_router();
        let response = router
            .oneshot(json_request(
                "POST",
                "/api/drone/missions",
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = body["error"]["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, ["name", "type", "schedule.startTime"]);
    }

    #[tokio::test]
    async fn unknown_mission_is_404() {
        let (router, _) = test_router();
        let response = router
            .oneshot(authed(
                Request::get(format!("/api/drone/missions/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn ingest_then_analytics() {
        let (router, _) = test_router();
        let id = create_mission(&router).await;

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/drone/missions/{id}/data"),
                serde_json::json!({
                    "position": { "lat": 53.3, "lng": -9.1 },
                    "altitude": 42.0,
                    "speed": 7.5,
                    "batteryLevel": 88.0,
                    "heading": 90.0,
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["sequence"], 0);

        let response = router
            .oneshot(authed(
                Request::get(format!("/api/drone/missions/{id}/analytics"))
                    .body(Body::empty())
                    .unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["analytics"]["totalFlightTime"], 1);
        assert_eq!(body["analytics"]["flightPath"].as_array().unwrap().len(), 1);
        assert!((body["analytics"]["recentAverages"]["altitude"].as_f64().unwrap() - 42.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn delete_requires_permission() {
        let (router, _) = test_router();
        let id = create_mission(&router).await;

        let response = router
            .clone()
            .oneshot(authed(
                Request::delete(format!("/api/drone/missions/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // A second delete finds nothing.
        let response = router
            .oneshot(authed(
                Request::delete(format!("/api/drone/missions/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_allows_only_configured_origins() {
        let mut config = test_config();
        config.cors_origins = vec!["http://ops.example.com".to_string()];

        let ctx = ApiContext::new(
            Arc::new(MemoryMissionStore::new()),
            Arc::new(StaticTokenAuth::new()),
            Arc::new(test_analyzer()),
            Arc::new(StaticWeather::clear_day()),
            config,
        );
        let router = build_router(ctx);

        let response = router
            .clone()
            .oneshot(
                Request::get("/api/health")
                    .header("origin", "http://ops.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "http://ops.example.com"
        );

        let response = router
            .oneshot(
                Request::get("/api/health")
                    .header("origin", "http://elsewhere.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }

    #[tokio::test]
    async fn weather_reports_flight_suitability() {
        let (router, _) = test_router();
        let response = router
            .oneshot(authed(
                Request::get("/api/weather/current?lat=53.27&lon=-9.05")
                    .body(Body::empty())
                    .unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["weather"]["flight"]["suitable"], true);
        assert_eq!(body["weather"]["location"]["coordinates"]["lat"], 53.27);
    }
}
