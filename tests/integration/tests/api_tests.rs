//! End-to-end tests against a running server with in-process backends.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use std::time::Duration;

use futures_util::StreamExt;
use integration_tests::{
    assert_json, assert_status, fixtures::*, TestServer, TestUser,
};
use reqwest::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use vibe_common::MatchSettings;

/// Enqueue two users in `voice`; returns (first, second, pairing as seen by second)
async fn pair(server: &TestServer) -> (TestUser, TestUser, PairingView) {
    let first = server.user().unwrap();
    let second = server.user().unwrap();

    let response = server
        .post_auth("/api/v1/match/requests", &first, &MatchRequest::voice())
        .await
        .unwrap();
    let waiting: StatusView = assert_json(response, StatusCode::ACCEPTED).await.unwrap();
    assert_eq!(waiting.state, "waiting");

    let response = server
        .post_auth("/api/v1/match/requests", &second, &MatchRequest::voice())
        .await
        .unwrap();
    let paired: StatusView = assert_json(response, StatusCode::OK).await.unwrap();
    let pairing = paired.paired().cloned().expect("second caller should be paired");

    (first, second, pairing)
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/health").await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server.get("/health/ready").await.unwrap();
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["store"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = TestServer::start().await.unwrap();
    let user = server.user().unwrap();
    let response = server.get_auth("/api/v1/match/status", &user).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/api/v1/match/status").await.unwrap();
    let body: ErrorView = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(body.error.code, "MISSING_AUTHORIZATION");
}

#[tokio::test]
async fn test_foreign_token_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let other = TestServer::start_with_config({
        let mut config = integration_tests::test_config(MatchSettings::default());
        config.jwt.secret = "some-other-secret".to_string();
        config
    })
    .await
    .unwrap();

    let stranger = other.user().unwrap();
    let response = server
        .get_auth("/api/v1/match/status", &stranger)
        .await
        .unwrap();
    let body: ErrorView = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(body.error.code, "INVALID_TOKEN");
}

// ============================================================================
// Pool
// ============================================================================

#[tokio::test]
async fn test_mutual_pairing_drains_pool() {
    let server = TestServer::start().await.unwrap();
    let (first, second, pairing) = pair(&server).await;

    assert_eq!(pairing.counterpart, first.id.to_string());
    assert_eq!(pairing.status, "active");
    assert_eq!(pairing.mode, "voice");
    assert!(pairing.remaining_ms > 0);

    // The first caller learns about it by polling
    let response = server.get_auth("/api/v1/match/status", &first).await.unwrap();
    let status: StatusView = assert_json(response, StatusCode::OK).await.unwrap();
    let seen = status.paired().expect("first caller should be paired");
    assert_eq!(seen.id, pairing.id);
    assert_eq!(seen.counterpart, second.id.to_string());
    assert_ne!(seen.side, pairing.side);

    let response = server
        .get_auth("/api/v1/match/pool/voice", &first)
        .await
        .unwrap();
    let pool: PoolView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(pool.count, 0);
}

#[tokio::test]
async fn test_request_while_paired_returns_existing_pairing() {
    let server = TestServer::start().await.unwrap();
    let (first, _, pairing) = pair(&server).await;

    let response = server
        .post_auth("/api/v1/match/requests", &first, &MatchRequest::mode("text"))
        .await
        .unwrap();
    let status: StatusView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(status.paired().unwrap().id, pairing.id);
}

#[tokio::test]
async fn test_cancel_then_requeue() {
    let server = TestServer::start().await.unwrap();
    let user = server.user().unwrap();

    let response = server
        .post_auth("/api/v1/match/requests", &user, &MatchRequest::mode("video"))
        .await
        .unwrap();
    let status: StatusView = assert_json(response, StatusCode::ACCEPTED).await.unwrap();
    assert_eq!(status.entry.unwrap().mode, "video");

    let response = server
        .get_auth("/api/v1/match/pool/video?limit=10", &user)
        .await
        .unwrap();
    let pool: PoolView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(pool.mode, "video");
    assert_eq!(pool.count, 1);
    assert_eq!(pool.entries[0]["user_id"], user.id.to_string());

    for _ in 0..2 {
        let response = server.delete_auth("/api/v1/match/requests", &user).await.unwrap();
        assert_status(response, StatusCode::NO_CONTENT).await.unwrap();
    }

    let response = server.get_auth("/api/v1/match/status", &user).await.unwrap();
    let status: StatusView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(status.state, "idle");

    let response = server
        .post_auth("/api/v1/match/requests", &user, &MatchRequest::mode("video"))
        .await
        .unwrap();
    assert_status(response, StatusCode::ACCEPTED).await.unwrap();
}

#[tokio::test]
async fn test_invalid_mode_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let user = server.user().unwrap();

    let response = server
        .post_auth("/api/v1/match/requests", &user, &MatchRequest::mode("smoke-signal"))
        .await
        .unwrap();
    let body: ErrorView = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(body.error.code, "INVALID_BODY");

    let response = server
        .get_auth("/api/v1/match/pool/voice?limit=500", &user)
        .await
        .unwrap();
    let body: ErrorView = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(body.error.code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_long_poll_wakes_when_paired() {
    let server = TestServer::start().await.unwrap();
    let first = server.user().unwrap();
    let second = server.user().unwrap();

    let response = server
        .post_auth("/api/v1/match/requests", &first, &MatchRequest::voice())
        .await
        .unwrap();
    assert_status(response, StatusCode::ACCEPTED).await.unwrap();

    let waiter = {
        let client = server.client.clone();
        let url = format!("{}/api/v1/match/wait?timeout_secs=10", server.base_url());
        let token = first.token.clone();
        tokio::spawn(async move { client.get(url).bearer_auth(token).send().await })
    };

    // Give the poll time to subscribe
    tokio::time::sleep(Duration::from_millis(200)).await;
    let response = server
        .post_auth("/api/v1/match/requests", &second, &MatchRequest::voice())
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = waiter.await.unwrap().unwrap();
    let status: StatusView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(
        status.paired().unwrap().counterpart,
        second.id.to_string()
    );
}

// ============================================================================
// Consent
// ============================================================================

#[tokio::test]
async fn test_both_votes_unlock_once() {
    let server = TestServer::start().await.unwrap();
    let (first, second, pairing) = pair(&server).await;
    let consent = format!("/api/v1/pairings/{}/consent", pairing.id);

    let response = server.act(&consent, &first).await.unwrap();
    let view: ConsentView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(view.outcome, "pending");
    assert!(view.pairing.your_consent);
    assert!(!view.pairing.their_consent);

    let response = server.act(&consent, &first).await.unwrap();
    let view: ConsentView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(view.outcome, "duplicate");

    let response = server.act(&consent, &second).await.unwrap();
    let view: ConsentView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(view.outcome, "unlocked");
    assert_eq!(view.pairing.status, "mutual");
    assert_eq!(
        view.pairing.rtc_channel.as_deref(),
        Some(format!("vibe-voice-{}", pairing.id).as_str())
    );

    let response = server.act(&consent, &first).await.unwrap();
    let view: ConsentView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(view.outcome, "already_unlocked");

    // Skipping an unlocked conversation is not a thing
    let response = server
        .act(&format!("/api/v1/pairings/{}/skip", pairing.id), &second)
        .await
        .unwrap();
    let body: ErrorView = assert_json(response, StatusCode::CONFLICT).await.unwrap();
    assert_eq!(body.error.code, "PAIRING_CLOSED");
}

#[tokio::test]
async fn test_skip_without_coins_offers_earn_back() {
    let server = TestServer::start().await.unwrap();
    let (first, second, pairing) = pair(&server).await;

    let response = server
        .act(&format!("/api/v1/pairings/{}/skip", pairing.id), &second)
        .await
        .unwrap();
    let view: AbandonView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(view.pairing.status, "abandoned");
    assert_eq!(view.pairing.end_reason.as_deref(), Some("skipped"));
    assert_eq!(view.pairing.closed_by, Some(second.id.to_string()));
    assert_eq!(view.penalty["result"], "earn_back");
    assert_eq!(view.penalty["offer"]["user_id"], second.id.to_string());

    // Both are free to search again
    let response = server.get_auth("/api/v1/match/status", &first).await.unwrap();
    let status: StatusView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(status.state, "idle");

    let response = server
        .act(&format!("/api/v1/pairings/{}/consent", pairing.id), &first)
        .await
        .unwrap();
    let body: ErrorView = assert_json(response, StatusCode::CONFLICT).await.unwrap();
    assert_eq!(body.error.code, "PAIRING_CLOSED");
}

#[tokio::test]
async fn test_outsiders_cannot_touch_a_pairing() {
    let server = TestServer::start().await.unwrap();
    let (_, _, pairing) = pair(&server).await;
    let outsider = server.user().unwrap();

    let response = server
        .get_auth(&format!("/api/v1/pairings/{}", pairing.id), &outsider)
        .await
        .unwrap();
    let body: ErrorView = assert_json(response, StatusCode::FORBIDDEN).await.unwrap();
    assert_eq!(body.error.code, "NOT_PARTICIPANT");

    let response = server
        .act(&format!("/api/v1/pairings/{}/consent", pairing.id), &outsider)
        .await
        .unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();
}

#[tokio::test]
async fn test_early_expiry_is_refused() {
    let server = TestServer::start().await.unwrap();
    let (first, _, pairing) = pair(&server).await;

    let response = server
        .act(&format!("/api/v1/pairings/{}/expire", pairing.id), &first)
        .await
        .unwrap();
    let body: ErrorView = assert_json(response, StatusCode::CONFLICT).await.unwrap();
    assert_eq!(body.error.code, "DEADLINE_NOT_REACHED");
}

#[tokio::test]
async fn test_countdown_expiry_by_client() {
    let server = TestServer::start_with_settings(MatchSettings {
        decision_window_secs: 1,
        expiry_grace_secs: 60,
        ..MatchSettings::default()
    })
    .await
    .unwrap();
    let (first, second, pairing) = pair(&server).await;

    let response = server
        .act(&format!("/api/v1/pairings/{}/consent", pairing.id), &first)
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1200)).await;

    let response = server
        .act(&format!("/api/v1/pairings/{}/expire", pairing.id), &second)
        .await
        .unwrap();
    let view: AbandonView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(view.pairing.status, "abandoned");
    assert_eq!(view.pairing.end_reason.as_deref(), Some("timed_out"));
    assert_eq!(view.pairing.remaining_ms, 0);
}

#[tokio::test]
async fn test_sweeper_closes_silent_pairings() {
    let server = TestServer::start_with_settings(MatchSettings {
        decision_window_secs: 1,
        expiry_grace_secs: 0,
        sweep_interval_secs: 1,
        ..MatchSettings::default()
    })
    .await
    .unwrap();
    let (first, _, pairing) = pair(&server).await;
    let path = format!("/api/v1/pairings/{}", pairing.id);

    let mut closed = None;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let response = server.get_auth(&path, &first).await.unwrap();
        let view: PairingView = assert_json(response, StatusCode::OK).await.unwrap();
        if view.status != "active" {
            closed = Some(view);
            break;
        }
    }

    let view = closed.expect("sweeper should close the pairing");
    assert_eq!(view.status, "abandoned");
    assert_eq!(view.end_reason.as_deref(), Some("timed_out"));
    assert_eq!(view.closed_by, None);
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_event_socket_announces_pairing() {
    let server = TestServer::start().await.unwrap();
    let first = server.user().unwrap();
    let second = server.user().unwrap();

    let mut socket = server.events(&first).await.unwrap();

    let response = server
        .post_auth("/api/v1/match/requests", &first, &MatchRequest::mode("text"))
        .await
        .unwrap();
    assert_status(response, StatusCode::ACCEPTED).await.unwrap();
    let response = server
        .post_auth("/api/v1/match/requests", &second, &MatchRequest::mode("text"))
        .await
        .unwrap();
    let status: StatusView = assert_json(response, StatusCode::OK).await.unwrap();
    let pairing_id = status.paired().unwrap().id.clone();

    let created = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(frame) = socket.next().await {
            if let Ok(Message::Text(text)) = frame {
                let event: serde_json::Value = serde_json::from_str(&text).unwrap();
                if event["type"] == "PAIRING_CREATED" {
                    return Some(event);
                }
            }
        }
        None
    })
    .await
    .expect("timed out waiting for PAIRING_CREATED")
    .expect("socket closed early");

    assert_eq!(created["pairing_id"], pairing_id);
    assert_eq!(created["mode"], "text");
}
