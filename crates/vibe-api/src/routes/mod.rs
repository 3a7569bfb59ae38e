//! Route definitions
//!
//! Matchmaking routes are mounted under /api/v1; health probes sit outside
//! so they skip rate limiting.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{events, health, matching, pairings};
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

fn api_v1_routes() -> Router<AppState> {
    Router::new().merge(match_routes()).merge(pairing_routes())
}

fn match_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/match/requests",
            post(matching::request_match).delete(matching::cancel_match),
        )
        .route("/match/status", get(matching::match_status))
        .route("/match/wait", get(matching::wait_for_match))
        .route("/match/pool/:mode", get(matching::pool_snapshot))
        .route("/match/events", get(events::match_events))
}

fn pairing_routes() -> Router<AppState> {
    Router::new()
        .route("/pairings/:pairing_id", get(pairings::get_pairing))
        .route("/pairings/:pairing_id/consent", post(pairings::submit_consent))
        .route("/pairings/:pairing_id/skip", post(pairings::skip_pairing))
        .route("/pairings/:pairing_id/expire", post(pairings::expire_pairing))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;
    use vibe_cache::LocalEventBus;
    use vibe_common::AppConfig;
    use vibe_core::UserId;
    use vibe_db::MemoryMatchStore;
    use vibe_service::MatchContext;

    use super::*;
    use crate::state::Backends;

    const SECRET: &str = "router-test-secret";

    fn app() -> (Router, AppState) {
        let store = Arc::new(MemoryMatchStore::new());
        let bus = Arc::new(LocalEventBus::default());
        let ctx = MatchContext::builder()
            .pool_store(store.clone())
            .pairing_store(store.clone())
            .ledger(store)
            .publisher(bus.clone())
            .events(bus)
            .build()
            .unwrap();
        let state = AppState::new(ctx, AppConfig::standalone(0, SECRET), Backends::default());
        let router = create_router()
            .merge(health_routes())
            .with_state(state.clone());
        (router, state)
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (router, _) = app();
        let response = router
            .clone()
            .oneshot(request(Method::GET, "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(request(Method::GET, "/health/ready", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_match_routes_require_a_token() {
        let (router, _) = app();
        let response = router
            .clone()
            .oneshot(request(Method::GET, "/api/v1/match/status", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .oneshot(request(Method::GET, "/api/v1/match/status", Some("not-a-jwt"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_request_then_cancel() {
        let (router, state) = app();
        let token = state.jwt_service().issue_access_token(UserId::random()).unwrap();

        let response = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/match/requests",
                Some(&token),
                Some(r#"{"mode":"voice"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let response = router
            .oneshot(request(Method::DELETE, "/api/v1/match/requests", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_bad_inputs_are_400() {
        let (router, state) = app();
        let token = state.jwt_service().issue_access_token(UserId::random()).unwrap();

        let cases = [
            (Method::POST, "/api/v1/match/requests", Some(r#"{"mode":"fax"}"#)),
            (Method::GET, "/api/v1/match/pool/fax", None),
            (Method::GET, "/api/v1/match/pool/voice?limit=0", None),
            (Method::GET, "/api/v1/match/pool/voice?limit=101", None),
            (Method::GET, "/api/v1/match/wait?timeout_secs=0", None),
            (Method::GET, "/api/v1/pairings/not-a-number", None),
        ];

        for (method, uri, body) in cases {
            let response = router
                .clone()
                .oneshot(request(method, uri, Some(&token), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_unknown_pairing_is_404() {
        let (router, state) = app();
        let token = state.jwt_service().issue_access_token(UserId::random()).unwrap();

        let response = router
            .oneshot(request(
                Method::POST,
                "/api/v1/pairings/175928847299117063/consent",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
