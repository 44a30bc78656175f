use std::sync::Arc;

use arena_domain::{
    app::construct_app,
    health::AlwaysHealthy,
    metrics::NoopMetricsSink,
    mock::MockStore,
};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{ApiState, build_router, metrics::ApiMetrics};

fn test_router() -> (MockStore, Router) {
    let store = MockStore::new();
    let app = construct_app(
        Arc::new(Box::new(store.player_repository())),
        Arc::new(Box::new(store.match_repository())),
        Arc::new(Box::new(store.transaction_repository())),
        Arc::new(Box::new(store.event_repository())),
        Arc::new(Box::new(AlwaysHealthy)),
        Arc::new(Box::new(NoopMetricsSink)),
    );
    let state = ApiState {
        app,
        metrics: Arc::new(ApiMetrics::new()),
    };
    (store, build_router(state))
}

async fn get(router: &Router, path: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(router: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn register(router: &Router, username: &str) -> i64 {
    let (status, body) = post(
        router,
        "/api/players/register",
        json!({ "username": username, "email": format!("{}@example.com", username) }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["player_id"].as_i64().unwrap()
}

async fn start_match(router: &Router, match_type: &str, player_ids: &[i64]) -> i64 {
    let (status, body) = post(
        router,
        "/api/matches/start",
        json!({ "match_type": match_type, "player_ids": player_ids }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["match_id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_register_and_fetch_player() {
    let (_, router) = test_router();
    let id = register(&router, "alice").await;

    let (status, body) = get(&router, &format!("/api/players/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["level"], 1);
    assert_eq!(body["total_points"], 0);
    assert_eq!(body["is_active"], true);
}

#[tokio::test]
async fn test_register_duplicate_username_rejected() {
    let (_, router) = test_router();
    register(&router, "alice").await;

    let (status, body) = post(
        &router,
        "/api/players/register",
        json!({ "username": "alice", "email": "other@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Username already exists");
}

#[tokio::test]
async fn test_register_invalid_email_rejected() {
    let (_, router) = test_router();
    let (status, _) = post(
        &router,
        "/api/players/register",
        json!({ "username": "alice", "email": "not-an-email" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_updates_last_login() {
    let (store, router) = test_router();
    let id = register(&router, "alice").await;

    let (status, body) = post(&router, "/api/players/login", json!({ "player_id": id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player_id"], id);
    assert!(body["last_login"].is_string());

    let events = store.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "login");
}

#[tokio::test]
async fn test_login_unknown_player_is_not_found() {
    let (_, router) = test_router();
    let (status, body) = post(&router, "/api/players/login", json!({ "player_id": 42 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Player not found");
}

#[tokio::test]
async fn test_start_match_creates_participants() {
    let (store, router) = test_router();
    let a = register(&router, "alice").await;
    let b = register(&router, "bob").await;
    let c = register(&router, "carol").await;

    let (status, body) = post(
        &router,
        "/api/matches/start",
        json!({ "match_type": "team", "player_ids": [a, b, c] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["match_type"], "team");
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["player_count"], 3);
    assert_eq!(body["server_region"], "us-east");

    let matches = store.matches();
    assert_eq!(matches.len(), 1);
}

#[tokio::test]
async fn test_start_match_with_unknown_player_is_bad_request() {
    let (_, router) = test_router();
    let a = register(&router, "alice").await;

    let (status, body) = post(
        &router,
        "/api/matches/start",
        json!({ "match_type": "solo", "player_ids": [a, 999] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Some players not found. Expected 2 players, found 1"
    );
}

#[tokio::test]
async fn test_start_match_with_invalid_type_is_bad_request() {
    let (_, router) = test_router();
    let a = register(&router, "alice").await;

    let (status, body) = post(
        &router,
        "/api/matches/start",
        json!({ "match_type": "ranked", "player_ids": [a] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Invalid match type: ranked. Must be 'solo', 'team', or 'tournament'"
    );
}

#[tokio::test]
async fn test_complete_match_then_recomplete_is_rejected() {
    let (_, router) = test_router();
    let a = register(&router, "alice").await;
    let b = register(&router, "bob").await;
    let match_id = start_match(&router, "solo", &[a, b]).await;

    let (status, body) = post(
        &router,
        "/api/matches/complete",
        json!({
            "match_id": match_id,
            "winner_id": a,
            "duration_seconds": 120,
            "participant_stats": [
                { "player_id": a, "score": 50, "kills": 5, "deaths": 1 },
                { "player_id": b, "score": 20, "kills": 2, "deaths": 5 }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["winner_id"], a);
    assert_eq!(body["message"], "Match completed successfully");

    let (winner_status, winner) = get(&router, &format!("/api/players/{}", a)).await;
    assert_eq!(winner_status, StatusCode::OK);
    assert_eq!(winner["total_points"], 50);

    let (status, body) = post(
        &router,
        "/api/matches/complete",
        json!({
            "match_id": match_id,
            "winner_id": a,
            "duration_seconds": 120,
            "participant_stats": []
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Match is not in progress");
}

#[tokio::test]
async fn test_crash_match_records_event() {
    let (store, router) = test_router();
    let a = register(&router, "alice").await;
    let b = register(&router, "bob").await;
    let match_id = start_match(&router, "solo", &[a, b]).await;

    let (status, body) = post(
        &router,
        "/api/matches/crash",
        json!({ "match_id": match_id, "error_message": "Server timeout" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "crashed");
    assert_eq!(body["message"], "Match marked as crashed");

    let events = store.events();
    let crash = events
        .iter()
        .find(|e| e.event_type == "server_crash")
        .unwrap();
    assert_eq!(
        crash.message,
        format!("Match {} crashed: Server timeout", match_id)
    );
}

#[tokio::test]
async fn test_crash_unknown_match_is_not_found() {
    let (_, router) = test_router();
    let (status, body) = post(
        &router,
        "/api/matches/crash",
        json!({ "match_id": 7, "error_message": "boom" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Match not found");
}

#[tokio::test]
async fn test_transaction_for_unknown_player_is_not_found() {
    let (_, router) = test_router();
    let (status, body) = post(
        &router,
        "/api/transactions/create",
        json!({
            "player_id": 99999,
            "item_type": "armor",
            "item_name": "Dragon Armor",
            "amount": 9.99
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Player not found with ID: 99999");
}

#[tokio::test]
async fn test_log_system_event() {
    let (store, router) = test_router();
    let (status, body) = post(
        &router,
        "/api/system/event",
        json!({
            "event_type": "maintenance",
            "severity": "warning",
            "message": "Scheduled restart",
            "metadata": { "region": "us-east" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event_type"], "maintenance");
    assert_eq!(body["severity"], "warning");
    assert_eq!(body["message"], "Event logged successfully");

    let events = store.events();
    assert_eq!(events.len(), 1);
    assert!(events[0].metadata.as_deref().unwrap().contains("us-east"));
}

#[tokio::test]
async fn test_leaderboard_respects_limit_and_order() {
    let (store, router) = test_router();
    let a = register(&router, "alice").await;
    let b = register(&router, "bob").await;
    let c = register(&router, "carol").await;
    store.set_total_points(a, 100);
    store.set_total_points(b, 300);
    store.set_total_points(c, 200);

    let (status, body) = get(&router, "/api/leaderboard?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["leaderboard"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[0]["username"], "bob");
    assert_eq!(entries[1]["rank"], 2);
    assert_eq!(entries[1]["username"], "carol");
}

#[tokio::test]
async fn test_stats_endpoints_report_counts() {
    let (_, router) = test_router();
    let a = register(&router, "alice").await;
    let b = register(&router, "bob").await;
    start_match(&router, "solo", &[a, b]).await;

    let (status, body) = get(&router, "/api/stats/players").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_players"], 2);
    assert_eq!(body["new_today"], 2);

    let (status, body) = get(&router, "/api/stats/matches").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_matches"], 1);
    assert_eq!(body["in_progress"], 1);
    assert_eq!(body["crash_rate_percent"], 0.0);

    let (status, body) = get(&router, "/api/stats/revenue").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revenue_today"], 0.0);
    assert_eq!(body["transactions_today"], 0);
}

#[tokio::test]
async fn test_health_reports_connected() {
    let (_, router) = test_router();
    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_metrics_exposition_counts_requests() {
    let (_, router) = test_router();
    let (status, _) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("endpoint=\"/health\""));
}
