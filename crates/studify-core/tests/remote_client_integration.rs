//! Integration tests for the hosted backend client against a mock server.

use chrono::{TimeZone, Utc};
use mockito::Matcher;
use serde_json::json;
use studify_core::{
    Event, RemoteError, RestClient, SessionLog, SessionLogSink, SinkDispatcher, SinkError,
    UserStats,
};
use tokio::sync::mpsc;

fn sample_log() -> SessionLog {
    SessionLog {
        user_id: "8c1f".into(),
        subject: Some("Math".into()),
        duration_minutes: 25,
        started_at: Utc.with_ymd_and_hms(2026, 2, 10, 14, 0, 0).unwrap(),
        completed_at: Utc.with_ymd_and_hms(2026, 2, 10, 14, 25, 0).unwrap(),
        was_completed: true,
    }
}

fn client(server: &mockito::Server, token: Option<&str>) -> RestClient {
    RestClient::new(
        Some(&server.url()),
        &server.url(),
        "anon-key",
        token.map(str::to_string),
    )
    .unwrap()
}

#[tokio::test]
async fn test_insert_session_posts_row_with_auth_headers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/pomodoro_sessions")
        .match_header("apikey", "anon-key")
        .match_header("authorization", "Bearer user-token")
        .match_header("prefer", "return=minimal")
        .match_body(Matcher::PartialJson(json!({
            "user_id": "8c1f",
            "subject": "Math",
            "duration_mins": 25,
            "was_completed": true,
        })))
        .with_status(201)
        .create_async()
        .await;

    client(&server, Some("user-token"))
        .insert_session(&sample_log())
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_insert_session_without_token_uses_anon_key() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/pomodoro_sessions")
        .match_header("authorization", "Bearer anon-key")
        .with_status(201)
        .create_async()
        .await;

    client(&server, None).insert_session(&sample_log()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_insert_session_rejection_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/rest/v1/pomodoro_sessions")
        .with_status(401)
        .with_body(r#"{"message":"JWT expired"}"#)
        .create_async()
        .await;

    let err = client(&server, Some("stale"))
        .insert_session(&sample_log())
        .await
        .unwrap_err();
    match err {
        SinkError::Rejected { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("JWT expired"));
        }
        other => panic!("Expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_dispatcher_reports_remote_failure_without_blocking() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/rest/v1/pomodoro_sessions")
        .with_status(500)
        .create_async()
        .await;

    let (reports_tx, mut reports) = mpsc::unbounded_channel();
    let (sink, handle) = SinkDispatcher::spawn(client(&server, Some("t")), reports_tx);
    assert!(sink.write(&sample_log()).is_ok());
    drop(sink);
    handle.await.unwrap();

    match reports.recv().await {
        Some(Event::SessionLogFailed { log, error, .. }) => {
            assert_eq!(log, sample_log());
            assert!(error.contains("500"));
        }
        other => panic!("Expected SessionLogFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_stats_parses_camel_case_totals() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/stats/8c1f")
        .match_header("authorization", "Bearer user-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "totalTasks": 12,
                "completedTasks": 7,
                "totalFocusMins": 250,
                "pomodorosCompleted": 10
            })
            .to_string(),
        )
        .create_async()
        .await;

    let stats = client(&server, Some("user-token"))
        .fetch_stats("8c1f")
        .await
        .unwrap();
    assert_eq!(
        stats,
        UserStats {
            total_tasks: 12,
            completed_tasks: 7,
            total_focus_mins: 250,
            pomodoros_completed: 10,
        }
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_stats_maps_auth_failures() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/stats/8c1f")
        .with_status(401)
        .with_body(r#"{"error":"Invalid or expired token"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/stats/someone-else")
        .with_status(403)
        .with_body(r#"{"error":"Forbidden"}"#)
        .create_async()
        .await;

    let c = client(&server, Some("user-token"));
    match c.fetch_stats("8c1f").await {
        Err(RemoteError::Unauthorized(msg)) => assert_eq!(msg, "Invalid or expired token"),
        other => panic!("Expected Unauthorized, got {other:?}"),
    }
    assert!(matches!(
        c.fetch_stats("someone-else").await,
        Err(RemoteError::Forbidden)
    ));
}

#[tokio::test]
async fn test_fetch_stats_requires_token() {
    let server = mockito::Server::new_async().await;
    assert!(matches!(
        client(&server, None).fetch_stats("8c1f").await,
        Err(RemoteError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_health_check() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/health")
        .with_status(200)
        .with_body(r#"{"status":"ok"}"#)
        .create_async()
        .await;

    assert!(client(&server, None).health().await.unwrap());
}
